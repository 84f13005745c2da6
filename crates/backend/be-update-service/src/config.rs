use std::path::PathBuf;

use anyhow::Result;
use be_auth_core::AdminAuthConfig;

const DEFAULT_RELEASES_DIR: &str = "releases";

#[derive(Debug)]
pub struct UpdateServiceConfig {
    /// Directory holding `{version}.json` and `latest-{channel}.json` files.
    pub releases_dir: PathBuf,
    pub auth: AdminAuthConfig,
}

impl UpdateServiceConfig {
    pub fn from_env() -> Result<Self> {
        let releases_dir = std::env::var("RELEASES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RELEASES_DIR));
        let auth = AdminAuthConfig::from_env()?;
        Ok(Self { releases_dir, auth })
    }
}
