use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use release_core::{Channel, ChannelSelector, ReleaseRecord};

use super::{ChannelLocks, PointerUpdate, ReleaseListing, ReleaseStore, next_pointer};
use crate::error::UpdateServiceError;

/// Process-local store, used by tests and for throwaway servers.
#[derive(Default)]
pub struct MemoryReleaseStore {
    locks: ChannelLocks,
    releases: RwLock<HashMap<String, ReleaseRecord>>,
    latest: RwLock<HashMap<Channel, ReleaseRecord>>,
}

impl MemoryReleaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReleaseStore for MemoryReleaseStore {
    async fn write(&self, record: ReleaseRecord) -> Result<PointerUpdate, UpdateServiceError> {
        let _guard = self.locks.lock(record.channel).await;

        {
            let mut releases = self.releases.write();
            if releases.contains_key(&record.version) {
                return Err(UpdateServiceError::VersionExists(record.version));
            }
            releases.insert(record.version.clone(), record.clone());
        }

        let mut latest = self.latest.write();
        let update = next_pointer(latest.get(&record.channel), &record);
        if update.advanced() {
            latest.insert(record.channel, record);
        }
        Ok(update)
    }

    async fn get_latest(
        &self,
        channel: Channel,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError> {
        Ok(self.latest.read().get(&channel).cloned())
    }

    async fn get_by_version(
        &self,
        version: &str,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError> {
        Ok(self.releases.read().get(version).cloned())
    }

    async fn list_by_channel(
        &self,
        selector: ChannelSelector,
    ) -> Result<ReleaseListing, UpdateServiceError> {
        let releases = self
            .releases
            .read()
            .values()
            .filter(|record| selector.includes(record.channel))
            .cloned()
            .collect();
        Ok(ReleaseListing::newest_first(releases))
    }
}
