//! Release persistence.
//!
//! A store keeps every published [`ReleaseRecord`] and, per channel, a pointer
//! to the record with the highest version. Writes to one channel are
//! serialized so the pointer can only move forward; reads never block on a
//! writer of another channel.

use std::sync::Arc;

use async_trait::async_trait;
use release_core::{Channel, ChannelSelector, ReleaseRecord};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::UpdateServiceError;

mod fs;
mod memory;

pub use fs::FsReleaseStore;
pub use memory::MemoryReleaseStore;

const MAX_VERSION_LEN: usize = 64;

/// Outcome of a successful write for the channel's latest pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerUpdate {
    Advanced,
    /// An existing release with a higher or equal version stays latest.
    Retained { latest: String },
}

impl PointerUpdate {
    pub fn advanced(&self) -> bool {
        matches!(self, PointerUpdate::Advanced)
    }
}

#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Persist a new release. Fails with [`UpdateServiceError::VersionExists`]
    /// when the version has been published before, on either channel.
    async fn write(&self, record: ReleaseRecord) -> Result<PointerUpdate, UpdateServiceError>;

    async fn get_latest(
        &self,
        channel: Channel,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError>;

    async fn get_by_version(
        &self,
        version: &str,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError>;

    async fn list_by_channel(
        &self,
        selector: ChannelSelector,
    ) -> Result<ReleaseListing, UpdateServiceError>;
}

/// Releases ordered newest first: by publish time, then by version.
///
/// The listing is an owned snapshot, so it can be iterated any number of
/// times and is unaffected by later writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReleaseListing(Vec<ReleaseRecord>);

impl ReleaseListing {
    pub fn newest_first(mut releases: Vec<ReleaseRecord>) -> Self {
        releases.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.parsed_version().cmp(&a.parsed_version()))
        });
        Self(releases)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReleaseRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for ReleaseListing {
    type Item = ReleaseRecord;
    type IntoIter = std::vec::IntoIter<ReleaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReleaseListing {
    type Item = &'a ReleaseRecord;
    type IntoIter = std::slice::Iter<'a, ReleaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One writer lock per channel.
///
/// Guards are owned so they can travel into blocking tasks: a write keeps its
/// channel locked until the last file operation returns, even if the caller
/// stops waiting for it.
#[derive(Debug, Default)]
pub(crate) struct ChannelLocks {
    stable: Arc<Mutex<()>>,
    beta: Arc<Mutex<()>>,
}

impl ChannelLocks {
    fn mutex(&self, channel: Channel) -> &Arc<Mutex<()>> {
        match channel {
            Channel::Stable => &self.stable,
            Channel::Beta => &self.beta,
        }
    }

    pub(crate) async fn lock(&self, channel: Channel) -> OwnedMutexGuard<()> {
        self.mutex(channel).clone().lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self, channel: Channel) -> bool {
        self.mutex(channel).try_lock().is_err()
    }
}

/// Decide the pointer move for `candidate` given the channel's current latest.
pub(crate) fn next_pointer(
    current: Option<&ReleaseRecord>,
    candidate: &ReleaseRecord,
) -> PointerUpdate {
    match current {
        Some(current) if !candidate.supersedes(current) => PointerUpdate::Retained {
            latest: current.version.clone(),
        },
        _ => PointerUpdate::Advanced,
    }
}

/// Whether `version` is usable as a storage key: it must start with a digit
/// and contain only ASCII alphanumerics and `.`, `-`, `+`, `_`.
pub fn is_valid_version_key(version: &str) -> bool {
    !version.is_empty()
        && version.len() <= MAX_VERSION_LEN
        && version.starts_with(|c: char| c.is_ascii_digit())
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
}
