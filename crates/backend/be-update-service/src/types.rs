use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use release_core::{LegacyRelease, ReleaseRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChannelParams {
    pub channel: String,
}

#[derive(Debug, Deserialize)]
pub struct VersionParams {
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub channel: String,
    pub platform: String,
    pub current_version: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

/// Release submitted by the publishing tool.
///
/// Every field is optional at the wire level so that validation can name the
/// offending field instead of failing on a generic decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub version: Option<String>,
    pub channel: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub mandatory: bool,
    pub download_urls: Option<BTreeMap<String, String>>,
}

/// Publish body in either accepted shape.
///
/// GitHub-release shaped bodies are recognised by their `assets` list; any
/// other object is read as a [`PublishRequest`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReleasePayload {
    GitHub(LegacyRelease),
    Canonical(PublishRequest),
}

impl ReleasePayload {
    pub fn into_request(self) -> PublishRequest {
        match self {
            ReleasePayload::Canonical(request) => request,
            ReleasePayload::GitHub(release) => {
                let channel = match release.channel.clone() {
                    Some(channel) => Some(channel),
                    None if release.prerelease => Some("beta".to_string()),
                    None => Some("stable".to_string()),
                };
                let download_urls = release
                    .asset_map()
                    .into_iter()
                    .map(|(platform, url)| (platform.as_str().to_string(), url))
                    .collect();
                PublishRequest {
                    version: release.resolved_version(),
                    channel,
                    // GitHub allows an empty body, so a missing one is not an error here.
                    notes: Some(release.notes.unwrap_or_default()),
                    mandatory: release.mandatory,
                    download_urls: Some(download_urls),
                }
            }
        }
    }
}

impl From<PublishRequest> for ReleasePayload {
    fn from(request: PublishRequest) -> Self {
        ReleasePayload::Canonical(request)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub message: String,
    pub release: ReleaseRecord,
    pub latest_advanced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_payload() {
        let payload: ReleasePayload = serde_json::from_str(
            r#"{
                "version": "1.1.0",
                "channel": "beta",
                "notes": "fixes",
                "downloadUrls": { "win": "http://x/a.exe" }
            }"#,
        )
        .unwrap();
        let request = payload.into_request();
        assert_eq!(request.version.as_deref(), Some("1.1.0"));
        assert_eq!(request.channel.as_deref(), Some("beta"));
        assert!(!request.mandatory);
        assert_eq!(
            request.download_urls.unwrap().get("win").map(String::as_str),
            Some("http://x/a.exe")
        );
    }

    #[test]
    fn test_github_payload() {
        let payload: ReleasePayload = serde_json::from_str(
            r#"{
                "tag_name": "v2.0.0-beta.1",
                "body": "Preview",
                "prerelease": true,
                "assets": [
                    { "name": "Ledger-2.0.0-beta.1.dmg", "browser_download_url": "https://example.com/l.dmg" }
                ]
            }"#,
        )
        .unwrap();
        assert!(matches!(payload, ReleasePayload::GitHub(_)));

        let request = payload.into_request();
        assert_eq!(request.version.as_deref(), Some("2.0.0-beta.1"));
        assert_eq!(request.channel.as_deref(), Some("beta"));
        assert_eq!(request.notes.as_deref(), Some("Preview"));
        assert_eq!(
            request.download_urls.unwrap().get("mac").map(String::as_str),
            Some("https://example.com/l.dmg")
        );
    }

    #[test]
    fn test_missing_fields_still_decode() {
        let payload: ReleasePayload = serde_json::from_str(r#"{ "channel": "stable" }"#).unwrap();
        let request = payload.into_request();
        assert!(request.version.is_none());
        assert!(request.notes.is_none());
        assert!(request.download_urls.is_none());
    }
}
