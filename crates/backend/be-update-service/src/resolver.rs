use std::sync::Arc;

use release_core::{Channel, Platform, UpdateDecision};
use tracing::{debug, instrument};

use crate::{error::UpdateServiceError, store::ReleaseStore};

/// Answers "is there something newer than what this client runs?".
#[derive(Clone)]
pub struct ReleaseResolver {
    store: Arc<dyn ReleaseStore>,
}

impl ReleaseResolver {
    pub fn new(store: Arc<dyn ReleaseStore>) -> Self {
        Self { store }
    }

    /// Compare the channel's latest release with `client_version`.
    ///
    /// Without a `platform` (or when the release ships nothing for it) an
    /// available update carries an empty download URL.
    #[instrument(skip(self))]
    pub async fn resolve_update(
        &self,
        channel: Channel,
        client_version: &str,
        platform: Option<Platform>,
    ) -> Result<UpdateDecision, UpdateServiceError> {
        let latest = self.store.get_latest(channel).await?;
        let decision = UpdateDecision::evaluate(latest.as_ref(), client_version, platform);
        debug!("Resolved update: available={}", decision.is_available());
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use release_core::ReleaseRecord;

    use super::*;
    use crate::store::MemoryReleaseStore;

    async fn resolver_with(releases: &[(&str, Channel, bool)]) -> ReleaseResolver {
        let store = Arc::new(MemoryReleaseStore::new());
        for (version, channel, mandatory) in releases {
            store
                .write(ReleaseRecord {
                    version: version.to_string(),
                    channel: *channel,
                    notes: "notes".to_string(),
                    published_at: Utc::now(),
                    mandatory: *mandatory,
                    assets: BTreeMap::from([(Platform::Mac, "http://x/l.dmg".to_string())]),
                })
                .await
                .unwrap();
        }
        ReleaseResolver::new(store)
    }

    #[tokio::test]
    async fn test_update_available_for_older_client() {
        let resolver = resolver_with(&[("1.1.0", Channel::Stable, true)]).await;

        let decision = resolver
            .resolve_update(Channel::Stable, "1.0.0", Some(Platform::Mac))
            .await
            .unwrap();
        let update = decision.into_available().unwrap();
        assert_eq!(update.version, "1.1.0");
        assert_eq!(update.download_url, "http://x/l.dmg");
        assert!(update.mandatory);
    }

    #[tokio::test]
    async fn test_missing_platform_asset_gives_empty_url() {
        let resolver = resolver_with(&[("1.1.0", Channel::Stable, false)]).await;

        let decision = resolver
            .resolve_update(Channel::Stable, "1.0.0", Some(Platform::Linux))
            .await
            .unwrap();
        let update = decision.available().unwrap();
        assert!(!update.is_downloadable());

        let no_platform = resolver
            .resolve_update(Channel::Stable, "1.0.0", None)
            .await
            .unwrap();
        assert_eq!(no_platform.available().unwrap().download_url, "");
    }

    #[tokio::test]
    async fn test_no_update_when_current_or_channel_empty() {
        let resolver = resolver_with(&[("1.1.0", Channel::Stable, false)]).await;

        for version in ["1.1.0", "1.2.0", "2.0.0-beta.1"] {
            let decision = resolver
                .resolve_update(Channel::Stable, version, Some(Platform::Mac))
                .await
                .unwrap();
            assert_eq!(decision, UpdateDecision::NoUpdateAvailable, "{version}");
        }

        let beta = resolver
            .resolve_update(Channel::Beta, "0.0.1", Some(Platform::Mac))
            .await
            .unwrap();
        assert_eq!(beta, UpdateDecision::NoUpdateAvailable);
    }
}
