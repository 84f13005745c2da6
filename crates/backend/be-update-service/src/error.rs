use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use be_auth_core::AuthError;
use release_core::{Channel, ParseChannelError, ParsePlatformError, Platform};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateServiceError {
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidPayload { field: String, reason: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version {0} already exists")]
    VersionExists(String),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UpdateServiceError {
    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        UpdateServiceError::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short identifier used in analytics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateServiceError::InvalidChannel(_) => "invalid_channel",
            UpdateServiceError::InvalidPlatform(_) => "invalid_platform",
            UpdateServiceError::InvalidPayload { .. } => "invalid_payload",
            UpdateServiceError::Unauthorized => "unauthorized",
            UpdateServiceError::NotFound(_) => "not_found",
            UpdateServiceError::VersionExists(_) => "version_exists",
            UpdateServiceError::Storage(_) => "storage_error",
            UpdateServiceError::Internal(_) => "internal_error",
        }
    }
}

pub fn parse_channel(raw: &str) -> Result<Channel, UpdateServiceError> {
    raw.parse()
        .map_err(|e: ParseChannelError| UpdateServiceError::InvalidChannel(e.0))
}

pub fn parse_platform(raw: &str) -> Result<Platform, UpdateServiceError> {
    raw.parse()
        .map_err(|e: ParsePlatformError| UpdateServiceError::InvalidPlatform(e.0))
}

impl From<AuthError> for UpdateServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => {
                UpdateServiceError::Unauthorized
            }
            other => UpdateServiceError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for UpdateServiceError {
    fn into_response(self) -> Response {
        let (status, message, details, field) = match &self {
            UpdateServiceError::InvalidChannel(c) => {
                warn!("Invalid channel: {}", c);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid channel",
                    Some(format!(
                        "Channel '{}' is not supported. Use 'stable' or 'beta'",
                        c
                    )),
                    None,
                )
            }
            UpdateServiceError::InvalidPlatform(p) => {
                warn!("Invalid platform: {}", p);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid platform",
                    Some(format!(
                        "Platform '{}' is not supported. Use 'win', 'mac', or 'linux'",
                        p
                    )),
                    None,
                )
            }
            UpdateServiceError::InvalidPayload { field, reason } => {
                warn!("Rejected release payload: {}: {}", field, reason);
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid release payload",
                    Some(reason.clone()),
                    Some(field.clone()),
                )
            }
            UpdateServiceError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some("A valid admin token is required".to_string()),
                None,
            ),
            UpdateServiceError::NotFound(what) => {
                (StatusCode::NOT_FOUND, "Not found", Some(what.clone()), None)
            }
            UpdateServiceError::VersionExists(v) => {
                warn!("Duplicate publish of version {}", v);
                (
                    StatusCode::CONFLICT,
                    "Version already exists",
                    Some(format!("Version {} has already been published", v)),
                    None,
                )
            }
            UpdateServiceError::Storage(e) => {
                error!("Release storage failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error",
                    None,
                    None,
                )
            }
            UpdateServiceError::Internal(e) => {
                error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message.to_string(),
            code: self.kind().to_string(),
            details,
            field,
        };

        (status, Json(body)).into_response()
    }
}
