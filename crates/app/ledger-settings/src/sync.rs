use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::Result;
use tracing::debug;

use crate::{AppSettings, SETTINGS_FILE};

/// Shared in-memory settings that are written through to disk on every change.
#[derive(Clone)]
pub struct SettingsWithDiskSync {
    config_path: PathBuf,
    snapshot: Arc<RwLock<AppSettings>>,
}

/// Wrapper that asserts mutations are saved to disk before being dropped.
struct SettingsEnforceSaveToDisk<'a> {
    config_path: &'a Path,
    snapshot: RwLockWriteGuard<'a, AppSettings>,
    saved: bool,
}

impl SettingsEnforceSaveToDisk<'_> {
    /// Persist `next` and only then make it the shared snapshot.
    fn save(&mut self, next: AppSettings) -> Result<()> {
        // Mark before save so a save failure doesn't trigger the Drop assertion
        self.saved = true;
        next.save(self.config_path)?;
        *self.snapshot = next;
        Ok(())
    }
}

impl Deref for SettingsEnforceSaveToDisk<'_> {
    type Target = AppSettings;

    fn deref(&self) -> &Self::Target {
        &self.snapshot
    }
}

impl Drop for SettingsEnforceSaveToDisk<'_> {
    fn drop(&mut self) {
        assert!(
            self.saved,
            "BUG: every change must immediately be saved to disk."
        );
    }
}

impl SettingsWithDiskSync {
    pub fn new(config_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_dir.as_ref().join(SETTINGS_FILE);
        let app_settings = AppSettings::load(&config_path)?;

        Ok(Self {
            config_path,
            snapshot: Arc::new(RwLock::new(app_settings)),
        })
    }

    pub fn get(&self) -> Result<RwLockReadGuard<'_, AppSettings>> {
        self.snapshot
            .read()
            .map_err(|e| anyhow::anyhow!("Could not read settings: {:?}", e))
    }

    /// Apply `change` and persist the result before releasing the lock.
    ///
    /// The shared settings are left untouched when saving fails.
    pub fn update(&self, change: impl FnOnce(&mut AppSettings)) -> Result<AppSettings> {
        let mut settings = self.get_mut_enforce_save()?;
        let mut next = settings.clone();
        change(&mut next);
        settings.save(next)?;
        debug!("Settings saved to {}", self.config_path.display());
        Ok(settings.clone())
    }

    fn get_mut_enforce_save(&self) -> Result<SettingsEnforceSaveToDisk<'_>> {
        self.snapshot
            .write()
            .map(|snapshot| SettingsEnforceSaveToDisk {
                snapshot,
                config_path: &self.config_path,
                saved: false,
            })
            .map_err(|e| anyhow::anyhow!("Could not write settings: {:?}", e))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
