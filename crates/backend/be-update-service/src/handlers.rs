use std::sync::Arc;

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use release_core::{Channel, ChannelSelector, UpdateDecision};
use tracing::{debug, instrument, warn};

use crate::{
    analytics,
    auth::AdminSession,
    error::{UpdateServiceError, parse_channel, parse_platform},
    service::AppState,
    types::{
        ChannelParams, CheckParams, LoginRequest, LoginResponse, PublishResponse, ReleasePayload,
        VersionParams,
    },
};

async fn latest_response(state: &AppState, channel: Channel) -> Response {
    match state.store.get_latest(channel).await {
        Ok(Some(release)) => {
            debug!("Latest {} release: {}", channel, release.version);
            (StatusCode::OK, Json(release)).into_response()
        }
        Ok(None) => UpdateServiceError::NotFound(format!(
            "No release has been published to the {channel} channel"
        ))
        .into_response(),
        Err(e) => {
            warn!("Latest release request failed: {}", e);
            e.into_response()
        }
    }
}

#[instrument(skip(state), fields(channel = %params.channel))]
pub async fn get_latest_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<ChannelParams>,
) -> Response {
    match parse_channel(&params.channel) {
        Ok(channel) => latest_response(&state, channel).await,
        Err(e) => e.into_response(),
    }
}

/// `/updates/latest` without a channel serves stable.
#[instrument(skip(state))]
pub async fn get_default_latest_handler(State(state): State<Arc<AppState>>) -> Response {
    latest_response(&state, Channel::Stable).await
}

#[instrument(skip(state), fields(channel = %params.channel))]
pub async fn list_releases_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<ChannelParams>,
) -> Response {
    let selector: ChannelSelector = match params.channel.parse() {
        Ok(selector) => selector,
        Err(_) => return UpdateServiceError::InvalidChannel(params.channel).into_response(),
    };

    match state.store.list_by_channel(selector).await {
        Ok(releases) => {
            debug!("Listing {} releases for {}", releases.len(), selector);
            (StatusCode::OK, Json(releases)).into_response()
        }
        Err(e) => {
            warn!("Release listing failed: {}", e);
            e.into_response()
        }
    }
}

#[instrument(skip(state), fields(version = %params.version))]
pub async fn get_version_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<VersionParams>,
) -> Response {
    match state.store.get_by_version(&params.version).await {
        Ok(Some(release)) => (StatusCode::OK, Json(release)).into_response(),
        Ok(None) => UpdateServiceError::NotFound(format!("Version {} not found", params.version))
            .into_response(),
        Err(e) => {
            warn!("Version lookup failed: {}", e);
            e.into_response()
        }
    }
}

#[instrument(skip(state), fields(
    channel = %params.channel,
    platform = %params.platform,
    current_version = %params.current_version
))]
pub async fn check_update_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<CheckParams>,
) -> Response {
    let channel = match parse_channel(&params.channel) {
        Ok(channel) => channel,
        Err(e) => return e.into_response(),
    };
    let platform = match parse_platform(&params.platform) {
        Ok(platform) => platform,
        Err(e) => return e.into_response(),
    };

    match state
        .resolver
        .resolve_update(channel, &params.current_version, Some(platform))
        .await
    {
        Ok(UpdateDecision::UpdateAvailable(update)) => {
            debug!("Update available: version {}", update.version);
            analytics::track_update_check(
                channel.as_str(),
                platform.as_str(),
                &params.current_version,
                true,
                Some(&update.version),
            );
            (StatusCode::OK, Json(update)).into_response()
        }
        Ok(UpdateDecision::NoUpdateAvailable) => {
            analytics::track_update_check(
                channel.as_str(),
                platform.as_str(),
                &params.current_version,
                false,
                None,
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!("Update check failed: {}", e);
            e.into_response()
        }
    }
}

#[instrument(skip_all)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return UpdateServiceError::invalid_payload("body", rejection.body_text())
                .into_response();
        }
    };

    match state.auth.login(&request.username, &request.password) {
        Ok(issued) => (
            StatusCode::OK,
            Json(LoginResponse {
                token: issued.token,
                token_type: "Bearer",
                expires_at: issued.expires_at,
                username: issued.claims.sub,
            }),
        )
            .into_response(),
        Err(e) => UpdateServiceError::from(e).into_response(),
    }
}

/// Publish a release. The admin session is resolved before the body is
/// decoded, so an unauthenticated caller never reaches validation.
#[instrument(skip_all)]
pub async fn publish_handler(
    State(state): State<Arc<AppState>>,
    session: Result<AdminSession, UpdateServiceError>,
    payload: Result<Json<ReleasePayload>, JsonRejection>,
) -> Response {
    let AdminSession(claims) = match session {
        Ok(session) => session,
        Err(e) => {
            analytics::track_publish_rejected(e.kind(), None);
            return e.into_response();
        }
    };

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let e = UpdateServiceError::invalid_payload("body", rejection.body_text());
            analytics::track_publish_rejected(e.kind(), Some("body"));
            return e.into_response();
        }
    };

    match state.gate.publish_as(&claims, payload).await {
        Ok(published) => {
            let advanced = published.pointer.advanced();
            analytics::track_release_published(
                published.record.channel.as_str(),
                &published.record.version,
                published.record.mandatory,
                advanced,
            );
            let message = if advanced {
                format!(
                    "Published {} as the latest {} release",
                    published.record.version, published.record.channel
                )
            } else {
                format!(
                    "Published {} to {}; a newer release remains latest",
                    published.record.version, published.record.channel
                )
            };
            (
                StatusCode::OK,
                Json(PublishResponse {
                    success: true,
                    message,
                    release: published.record,
                    latest_advanced: advanced,
                }),
            )
                .into_response()
        }
        Err(e) => {
            let field = match &e {
                UpdateServiceError::InvalidPayload { field, .. } => Some(field.as_str()),
                _ => None,
            };
            analytics::track_publish_rejected(e.kind(), field);
            e.into_response()
        }
    }
}
