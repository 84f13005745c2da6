use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Channel, Platform, ReleaseVersion};

/// One published version with its per-platform download links.
///
/// Records are created once by the publish path and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    pub version: String,
    pub channel: Channel,
    #[serde(default)]
    pub notes: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub mandatory: bool,
    pub assets: BTreeMap<Platform, String>,
}

impl ReleaseRecord {
    pub fn parsed_version(&self) -> ReleaseVersion {
        ReleaseVersion::parse(&self.version)
    }

    pub fn download_url(&self, platform: Platform) -> Option<&str> {
        self.assets.get(&platform).map(String::as_str)
    }

    /// Whether this record should replace `other` as the latest of a channel.
    pub fn supersedes(&self, other: &ReleaseRecord) -> bool {
        self.parsed_version().is_newer_than(&other.parsed_version())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(version: &str) -> ReleaseRecord {
        ReleaseRecord {
            version: version.to_string(),
            channel: Channel::Stable,
            notes: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            mandatory: false,
            assets: BTreeMap::from([(Platform::Win, "http://x/a.exe".to_string())]),
        }
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record("1.2.0")).unwrap();
        assert_eq!(json["version"], "1.2.0");
        assert_eq!(json["channel"], "stable");
        assert_eq!(json["publishedAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["assets"]["win"], "http://x/a.exe");
        assert_eq!(json["mandatory"], false);
    }

    #[test]
    fn test_download_url_by_platform() {
        let release = record("1.2.0");
        assert_eq!(release.download_url(Platform::Win), Some("http://x/a.exe"));
        assert_eq!(release.download_url(Platform::Linux), None);
    }

    #[test]
    fn test_supersedes_follows_version_order() {
        assert!(record("1.0.1").supersedes(&record("1.0.0")));
        assert!(!record("1.0.0").supersedes(&record("1.0.1")));
        assert!(!record("1.0.0").supersedes(&record("1.0.0")));
    }
}
