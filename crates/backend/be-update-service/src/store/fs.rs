use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use release_core::{Channel, ChannelSelector, ReleaseDocument, ReleaseRecord};
use tracing::{debug, warn};

use super::{
    ChannelLocks, PointerUpdate, ReleaseListing, ReleaseStore, is_valid_version_key, next_pointer,
};
use crate::error::UpdateServiceError;

const LATEST_PREFIX: &str = "latest";

/// Releases as JSON files in a single directory.
///
/// Each release lives in `{version}.json`; each channel has a
/// `latest-{channel}.json` holding a full copy of its latest record. Release
/// files are created exclusively, so a version can never be overwritten, and
/// the pointer file is replaced atomically.
pub struct FsReleaseStore {
    root: PathBuf,
    locks: ChannelLocks,
}

impl FsReleaseStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: ChannelLocks::default(),
        }
    }

    /// Create the releases directory if needed and open a store on it.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create releases directory {}", root.display()))?;
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn record_path(root: &Path, version: &str) -> PathBuf {
    root.join(format!("{version}.json"))
}

fn latest_path(root: &Path, channel: Channel) -> PathBuf {
    root.join(format!("{LATEST_PREFIX}-{channel}.json"))
}

fn read_record(path: &Path) -> anyhow::Result<Option<ReleaseRecord>> {
    let Some(document) = ledger_fs::read_json_file::<ReleaseDocument>(path)? else {
        return Ok(None);
    };
    let record = document
        .into_record()
        .with_context(|| format!("Unusable release document {}", path.display()))?;
    Ok(Some(record))
}

fn is_pointer_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LATEST_PREFIX))
}

async fn run_blocking<T, F>(task: F) -> Result<T, UpdateServiceError>
where
    F: FnOnce() -> Result<T, UpdateServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .context("Release storage task did not complete")?
}

fn write_locked(root: &Path, record: &ReleaseRecord) -> Result<PointerUpdate, UpdateServiceError> {
    let body = serde_json::to_vec_pretty(record).context("Failed to serialize release")?;

    let path = record_path(root, &record.version);
    match ledger_fs::write_new(&path, &body) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(UpdateServiceError::VersionExists(record.version.clone()));
        }
        Err(err) => {
            return Err(anyhow!(err)
                .context(format!("Failed to write {}", path.display()))
                .into());
        }
    }

    let pointer = latest_path(root, record.channel);
    let update = read_record(&pointer).and_then(|current| {
        let update = next_pointer(current.as_ref(), record);
        if update.advanced() {
            ledger_fs::write(&pointer, &body)?;
        }
        Ok(update)
    });

    match update {
        Ok(update) => Ok(update),
        Err(err) => {
            // The release is only published once the pointer is consistent with it.
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!(
                    "Failed to roll back {} after pointer failure: {}",
                    path.display(),
                    remove_err
                );
            }
            Err(err.into())
        }
    }
}

#[async_trait]
impl ReleaseStore for FsReleaseStore {
    async fn write(&self, record: ReleaseRecord) -> Result<PointerUpdate, UpdateServiceError> {
        let guard = self.locks.lock(record.channel).await;
        let root = self.root.clone();
        let update = run_blocking(move || {
            let _guard = guard;
            write_locked(&root, &record)
        })
        .await?;
        debug!("Release written, pointer update: {:?}", update);
        Ok(update)
    }

    async fn get_latest(
        &self,
        channel: Channel,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError> {
        let path = latest_path(&self.root, channel);
        run_blocking(move || Ok(read_record(&path)?)).await
    }

    async fn get_by_version(
        &self,
        version: &str,
    ) -> Result<Option<ReleaseRecord>, UpdateServiceError> {
        if !is_valid_version_key(version) {
            return Ok(None);
        }
        let path = record_path(&self.root, version);
        run_blocking(move || Ok(read_record(&path)?)).await
    }

    async fn list_by_channel(
        &self,
        selector: ChannelSelector,
    ) -> Result<ReleaseListing, UpdateServiceError> {
        let root = self.root.clone();
        run_blocking(move || {
            let mut releases = Vec::new();
            for path in ledger_fs::list_files(&root, "json")? {
                if is_pointer_file(&path) {
                    continue;
                }
                if let Some(record) = read_record(&path)?
                    && selector.includes(record.channel)
                {
                    releases.push(record);
                }
            }
            Ok(ReleaseListing::newest_first(releases))
        })
        .await
    }
}
