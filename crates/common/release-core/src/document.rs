//! Normalization of the release document shapes found in the wild.
//!
//! Besides the canonical [`ReleaseRecord`] JSON, older publishers wrote
//! GitHub-release shaped documents (`tag_name`, `body`, `published_at`,
//! `assets[].browser_download_url`) and a flat variant that kept `version`
//! but stored assets as a list. Everything is turned into a canonical record
//! here so callers never branch on shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Channel, Platform, ReleaseRecord};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReleaseDocument {
    Canonical(ReleaseRecord),
    Legacy(LegacyRelease),
}

/// Release in the list-of-assets shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyRelease {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default, alias = "body")]
    pub notes: Option<String>,
    #[serde(default, alias = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub mandatory: bool,
    pub assets: Vec<LegacyAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyAsset {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("release document has neither 'version' nor 'tag_name'")]
    MissingVersion,
    #[error("release document names unknown channel '{0}'")]
    UnknownChannel(String),
}

impl LegacyRelease {
    /// Version from `version`, falling back to `tag_name` without its `v` prefix.
    pub fn resolved_version(&self) -> Option<String> {
        self.version
            .as_deref()
            .or_else(|| {
                self.tag_name
                    .as_deref()
                    .map(|tag| tag.strip_prefix('v').unwrap_or(tag))
            })
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .map(str::to_string)
    }

    /// Explicit channel if present, otherwise `beta` for pre-releases.
    pub fn resolved_channel(&self) -> Result<Channel, DocumentError> {
        match self.channel.as_deref() {
            Some(channel) => channel
                .parse()
                .map_err(|_| DocumentError::UnknownChannel(channel.to_string())),
            None if self.prerelease => Ok(Channel::Beta),
            None => Ok(Channel::Stable),
        }
    }

    /// Asset URLs keyed by platform. Assets whose platform cannot be told
    /// from either `platform` or the file name are skipped; the first asset
    /// for a platform wins.
    pub fn asset_map(&self) -> BTreeMap<Platform, String> {
        let mut assets = BTreeMap::new();
        for asset in &self.assets {
            let platform = asset
                .platform
                .as_deref()
                .and_then(|key| key.parse::<Platform>().ok())
                .or_else(|| asset.name.as_deref().and_then(Platform::from_asset_name));
            if let Some(platform) = platform {
                assets
                    .entry(platform)
                    .or_insert_with(|| asset.browser_download_url.clone());
            }
        }
        assets
    }

    pub fn into_record(self) -> Result<ReleaseRecord, DocumentError> {
        let version = self.resolved_version().ok_or(DocumentError::MissingVersion)?;
        let channel = self.resolved_channel()?;
        let assets = self.asset_map();
        Ok(ReleaseRecord {
            version,
            channel,
            notes: self.notes.unwrap_or_default(),
            published_at: self.published_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            mandatory: self.mandatory,
            assets,
        })
    }
}

impl ReleaseDocument {
    pub fn into_record(self) -> Result<ReleaseRecord, DocumentError> {
        match self {
            ReleaseDocument::Canonical(record) => Ok(record),
            ReleaseDocument::Legacy(legacy) => legacy.into_record(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ReleaseRecord {
        serde_json::from_str::<ReleaseDocument>(json)
            .unwrap()
            .into_record()
            .unwrap()
    }

    #[test]
    fn test_canonical_document() {
        let record = parse(
            r#"{
                "version": "1.1.0",
                "channel": "beta",
                "notes": "fixes",
                "publishedAt": "2024-03-01T10:00:00Z",
                "mandatory": true,
                "assets": { "win": "http://x/a.exe" }
            }"#,
        );
        assert_eq!(record.version, "1.1.0");
        assert_eq!(record.channel, Channel::Beta);
        assert!(record.mandatory);
        assert_eq!(record.download_url(Platform::Win), Some("http://x/a.exe"));
    }

    #[test]
    fn test_github_shaped_document() {
        let record = parse(
            r#"{
                "tag_name": "v1.0.0",
                "name": "Ledger v1.0.0",
                "body": "Initial release",
                "published_at": "2024-01-02T03:04:05Z",
                "channel": "stable",
                "assets": [
                    { "platform": "win", "browser_download_url": "https://example.com/a.exe", "name": "Ledger-1.0.0-win.exe" },
                    { "browser_download_url": "https://example.com/a.dmg", "name": "Ledger-1.0.0.dmg" }
                ]
            }"#,
        );
        assert_eq!(record.version, "1.0.0");
        assert_eq!(record.notes, "Initial release");
        assert_eq!(record.channel, Channel::Stable);
        assert_eq!(
            record.download_url(Platform::Mac),
            Some("https://example.com/a.dmg")
        );
        assert!(!record.mandatory);
    }

    #[test]
    fn test_flat_document_with_asset_list() {
        let record = parse(
            r#"{
                "version": "2.0.0-beta.1",
                "notes": "preview",
                "channel": "beta",
                "mandatory": false,
                "publishedAt": "2024-06-01T00:00:00Z",
                "assets": [ { "platform": "linux", "browser_download_url": "https://example.com/a.AppImage" } ]
            }"#,
        );
        assert_eq!(record.version, "2.0.0-beta.1");
        assert_eq!(record.channel, Channel::Beta);
        assert_eq!(record.assets.len(), 1);
    }

    #[test]
    fn test_prerelease_flag_selects_beta() {
        let record = parse(
            r#"{ "tag_name": "v3.0.0-beta.2", "prerelease": true, "assets": [] }"#,
        );
        assert_eq!(record.channel, Channel::Beta);
        assert_eq!(record.published_at, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let document: ReleaseDocument =
            serde_json::from_str(r#"{ "body": "no version", "assets": [] }"#).unwrap();
        assert_eq!(
            document.into_record().unwrap_err(),
            DocumentError::MissingVersion
        );
    }

    #[test]
    fn test_unknown_channel_is_rejected() {
        let document: ReleaseDocument =
            serde_json::from_str(r#"{ "version": "1.0.0", "channel": "nightly", "assets": [] }"#)
                .unwrap();
        assert_eq!(
            document.into_record().unwrap_err(),
            DocumentError::UnknownChannel("nightly".to_string())
        );
    }
}
