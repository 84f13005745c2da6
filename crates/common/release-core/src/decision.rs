use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Channel, Platform, ReleaseRecord, ReleaseVersion};

/// Everything a client needs to offer an upgrade.
///
/// `download_url` is empty when the release ships nothing for the requesting
/// platform: the update exists but cannot be downloaded there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableUpdate {
    pub version: String,
    pub download_url: String,
    pub notes: String,
    pub published_at: DateTime<Utc>,
    pub mandatory: bool,
    pub channel: Channel,
}

impl AvailableUpdate {
    pub fn is_downloadable(&self) -> bool {
        !self.download_url.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UpdateDecision {
    NoUpdateAvailable,
    UpdateAvailable(AvailableUpdate),
}

impl UpdateDecision {
    /// Decide whether `latest` is an upgrade for a client running `client_version`.
    pub fn evaluate(
        latest: Option<&ReleaseRecord>,
        client_version: &str,
        platform: Option<Platform>,
    ) -> Self {
        let Some(latest) = latest else {
            return UpdateDecision::NoUpdateAvailable;
        };

        if !latest
            .parsed_version()
            .is_newer_than(&ReleaseVersion::parse(client_version))
        {
            return UpdateDecision::NoUpdateAvailable;
        }

        let download_url = platform
            .and_then(|platform| latest.download_url(platform))
            .unwrap_or_default()
            .to_string();

        UpdateDecision::UpdateAvailable(AvailableUpdate {
            version: latest.version.clone(),
            download_url,
            notes: latest.notes.clone(),
            published_at: latest.published_at,
            mandatory: latest.mandatory,
            channel: latest.channel,
        })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, UpdateDecision::UpdateAvailable(_))
    }

    pub fn available(&self) -> Option<&AvailableUpdate> {
        match self {
            UpdateDecision::UpdateAvailable(update) => Some(update),
            UpdateDecision::NoUpdateAvailable => None,
        }
    }

    pub fn into_available(self) -> Option<AvailableUpdate> {
        match self {
            UpdateDecision::UpdateAvailable(update) => Some(update),
            UpdateDecision::NoUpdateAvailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn latest(version: &str, mandatory: bool) -> ReleaseRecord {
        ReleaseRecord {
            version: version.to_string(),
            channel: Channel::Beta,
            notes: "notes".to_string(),
            published_at: Utc::now(),
            mandatory,
            assets: BTreeMap::from([(Platform::Win, "http://x/a.exe".to_string())]),
        }
    }

    #[test]
    fn test_no_latest_means_no_update() {
        assert_eq!(
            UpdateDecision::evaluate(None, "1.0.0", Some(Platform::Win)),
            UpdateDecision::NoUpdateAvailable
        );
    }

    #[test]
    fn test_client_ahead_of_latest() {
        let record = latest("1.1.0", false);
        let decision = UpdateDecision::evaluate(Some(&record), "9.9.9", Some(Platform::Win));
        assert!(!decision.is_available());
    }

    #[test]
    fn test_equal_versions_do_not_update() {
        let record = latest("1.1.0", false);
        let decision = UpdateDecision::evaluate(Some(&record), "1.1.0", Some(Platform::Win));
        assert_eq!(decision, UpdateDecision::NoUpdateAvailable);
    }

    #[test]
    fn test_update_available_carries_platform_url() {
        let record = latest("1.1.0", true);
        let update = UpdateDecision::evaluate(Some(&record), "1.0.0", Some(Platform::Win))
            .into_available()
            .unwrap();
        assert_eq!(update.version, "1.1.0");
        assert_eq!(update.download_url, "http://x/a.exe");
        assert!(update.mandatory);
        assert_eq!(update.channel, Channel::Beta);
        assert!(update.is_downloadable());
    }

    #[test]
    fn test_missing_platform_asset_yields_empty_url() {
        let record = latest("1.1.0", false);
        let update = UpdateDecision::evaluate(Some(&record), "1.0.0", Some(Platform::Linux))
            .into_available()
            .unwrap();
        assert_eq!(update.download_url, "");
        assert!(!update.is_downloadable());
    }

    #[test]
    fn test_decision_json_is_tagged() {
        let json = serde_json::to_value(UpdateDecision::NoUpdateAvailable).unwrap();
        assert_eq!(json["status"], "noUpdateAvailable");

        let record = latest("1.1.0", false);
        let json = serde_json::to_value(UpdateDecision::evaluate(
            Some(&record),
            "1.0.0",
            Some(Platform::Win),
        ))
        .unwrap();
        assert_eq!(json["status"], "updateAvailable");
        assert_eq!(json["downloadUrl"], "http://x/a.exe");
    }
}
