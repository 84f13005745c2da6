//! Persistent user settings for the desktop app.
//!
//! Settings are the defaults in `assets/defaults.jsonc` overlaid with the
//! user's `settings.json`. Saving writes back only what differs.

use release_core::Channel;
use serde::{Deserialize, Serialize};

mod json;
mod persistence;
mod sync;

pub use persistence::SETTINGS_FILE;
pub use sync::SettingsWithDiskSync;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub updates: UpdateSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettings {
    pub channel: Channel,
    pub server_url: String,
    pub last_known_version: Option<String>,
}
