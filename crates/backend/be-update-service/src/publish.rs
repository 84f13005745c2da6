//! Authenticated publishing.
//!
//! [`PublishGate`] is the only path that writes to a [`ReleaseStore`]. It
//! checks the admin token, validates the payload, and then performs exactly
//! one store write. Any failure before the write leaves the store untouched.

use std::{collections::BTreeMap, sync::Arc};

use be_auth_core::{AdminAuth, AdminClaims};
use chrono::{DateTime, Utc};
use release_core::{Channel, Platform, ReleaseRecord};
use tracing::{info, instrument, warn};
use url::Url;

use crate::{
    error::UpdateServiceError,
    store::{PointerUpdate, ReleaseStore, is_valid_version_key},
    types::{PublishRequest, ReleasePayload},
};

#[derive(Debug, Clone)]
pub struct PublishedRelease {
    pub record: ReleaseRecord,
    pub pointer: PointerUpdate,
}

/// A publish request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRelease {
    pub version: String,
    pub channel: Channel,
    pub notes: String,
    pub mandatory: bool,
    pub assets: BTreeMap<Platform, String>,
}

impl ValidatedRelease {
    pub fn into_record(self, published_at: DateTime<Utc>) -> ReleaseRecord {
        ReleaseRecord {
            version: self.version,
            channel: self.channel,
            notes: self.notes,
            published_at,
            mandatory: self.mandatory,
            assets: self.assets,
        }
    }
}

/// Check a request field by field, in the order version, channel, notes,
/// downloadUrls. The first failing field is reported.
pub fn validate_request(request: PublishRequest) -> Result<ValidatedRelease, UpdateServiceError> {
    let version = request
        .version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| UpdateServiceError::invalid_payload("version", "version is required"))?;
    if !is_valid_version_key(&version) {
        return Err(UpdateServiceError::invalid_payload(
            "version",
            format!(
                "'{version}' is not a release version; expected digits and dots such as 1.2.0 or 1.2.0-beta.1"
            ),
        ));
    }

    let channel = request
        .channel
        .ok_or_else(|| UpdateServiceError::invalid_payload("channel", "channel is required"))?;
    let channel: Channel = channel.parse().map_err(|_| {
        UpdateServiceError::invalid_payload(
            "channel",
            format!("'{channel}' is not a channel; use 'stable' or 'beta'"),
        )
    })?;

    let notes = request
        .notes
        .ok_or_else(|| UpdateServiceError::invalid_payload("notes", "notes are required"))?;

    let download_urls = request.download_urls.unwrap_or_default();
    let mut assets = BTreeMap::new();
    for (key, raw_url) in download_urls {
        let url = raw_url.trim();
        if url.is_empty() {
            continue;
        }
        let platform: Platform = key.parse().map_err(|_| {
            UpdateServiceError::invalid_payload(
                "downloadUrls",
                format!("'{key}' is not a platform; use 'win', 'mac' or 'linux'"),
            )
        })?;
        let parsed = Url::parse(url).map_err(|e| {
            UpdateServiceError::invalid_payload(
                "downloadUrls",
                format!("download URL for {platform} is invalid: {e}"),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UpdateServiceError::invalid_payload(
                "downloadUrls",
                format!("download URL for {platform} must use http or https"),
            ));
        }
        if assets.insert(platform, url.to_string()).is_some() {
            return Err(UpdateServiceError::invalid_payload(
                "downloadUrls",
                format!("more than one download URL given for {platform}"),
            ));
        }
    }
    if assets.is_empty() {
        return Err(UpdateServiceError::invalid_payload(
            "downloadUrls",
            "at least one download URL is required",
        ));
    }

    Ok(ValidatedRelease {
        version,
        channel,
        notes,
        mandatory: request.mandatory,
        assets,
    })
}

#[derive(Clone)]
pub struct PublishGate {
    auth: Arc<AdminAuth>,
    store: Arc<dyn ReleaseStore>,
}

impl PublishGate {
    pub fn new(auth: Arc<AdminAuth>, store: Arc<dyn ReleaseStore>) -> Self {
        Self { auth, store }
    }

    /// Resolve a bearer token into admin claims.
    pub fn authorize(&self, token: Option<&str>) -> Result<AdminClaims, UpdateServiceError> {
        let token = token.ok_or(UpdateServiceError::Unauthorized)?;
        self.auth.validate_token(token).map_err(|e| {
            warn!("Publish rejected: {}", e);
            UpdateServiceError::from(e)
        })
    }

    /// Authorize and publish in one step.
    pub async fn publish(
        &self,
        token: Option<&str>,
        payload: ReleasePayload,
    ) -> Result<PublishedRelease, UpdateServiceError> {
        let claims = self.authorize(token)?;
        self.publish_as(&claims, payload).await
    }

    #[instrument(skip_all, fields(admin = %claims.sub))]
    pub async fn publish_as(
        &self,
        claims: &AdminClaims,
        payload: ReleasePayload,
    ) -> Result<PublishedRelease, UpdateServiceError> {
        let validated = validate_request(payload.into_request())?;
        let record = validated.into_record(Utc::now());

        let pointer = self.store.write(record.clone()).await?;
        info!(
            "Published {} to {} (latest advanced: {})",
            record.version,
            record.channel,
            pointer.advanced()
        );
        Ok(PublishedRelease { record, pointer })
    }
}
