use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ledger_fs::create_dirs_then_write;
use serde_json::json;
use serde_json_lenient::to_string_pretty;

use crate::{
    AppSettings,
    json::{json_difference, merge_non_null_json_value},
};

pub(crate) static DEFAULTS: &str = include_str!("../assets/defaults.jsonc");

pub const SETTINGS_FILE: &str = "settings.json";
const APP_DIR: &str = "ledger";

impl AppSettings {
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            create_dirs_then_write(config_path, "{}\n")?;
        }

        let raw = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let customizations = serde_json_lenient::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        let mut settings: serde_json::Value = serde_json_lenient::from_str(DEFAULTS)?;

        merge_non_null_json_value(customizations, &mut settings);

        let mut app_settings: AppSettings = serde_json::from_value(settings)?;

        if let Ok(server_url) = std::env::var("UPDATE_SERVER_URL")
            && !server_url.is_empty()
        {
            app_settings.updates.server_url = server_url;
        }

        Ok(app_settings)
    }

    pub fn default_config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("No config directory on this platform")?
            .join(APP_DIR))
    }

    /// Save only values that differ from what is already on disk.
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let current = serde_json::to_value(AppSettings::load(config_path)?)?;
        let update = serde_json::to_value(self)?;
        let diff = json_difference(current, &update);

        if diff == json!({}) {
            return Ok(());
        }

        let mut customizations =
            serde_json_lenient::from_str(&std::fs::read_to_string(config_path)?)?;

        // Comments in the user's file are not preserved.
        merge_non_null_json_value(diff, &mut customizations);
        create_dirs_then_write(config_path, to_string_pretty(&customizations)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use release_core::Channel;

    use super::*;

    #[test]
    fn load_creates_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let settings = AppSettings::load(&path).unwrap();

        assert!(path.exists());
        assert_eq!(settings.updates.channel, Channel::Stable);
        assert_eq!(settings.updates.last_known_version, None);
    }

    #[test]
    fn save_writes_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        let mut settings = AppSettings::load(&path).unwrap();
        settings.updates.channel = Channel::Beta;
        settings.updates.last_known_version = Some("1.0.0".to_string());
        settings.save(&path).unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            json!({ "updates": { "channel": "beta", "lastKnownVersion": "1.0.0" } })
        );

        let reloaded = AppSettings::load(&path).unwrap();
        assert_eq!(reloaded.updates.channel, Channel::Beta);
        assert_eq!(reloaded.updates.last_known_version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn default_config_dir_is_app_specific() {
        let dir = AppSettings::default_config_dir().unwrap();
        assert_eq!(dir.file_name().and_then(|n| n.to_str()), Some(APP_DIR));
    }

    #[test]
    fn user_file_may_contain_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            "{\n  // follow previews\n  \"updates\": { \"channel\": \"beta\" }\n}\n",
        )
        .unwrap();

        let settings = AppSettings::load(&path).unwrap();
        assert_eq!(settings.updates.channel, Channel::Beta);
    }
}
