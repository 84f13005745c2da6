use std::sync::Arc;

use anyhow::{Context, Result};
use be_auth_core::AdminAuth;

use crate::{
    config::UpdateServiceConfig,
    publish::PublishGate,
    resolver::ReleaseResolver,
    store::{FsReleaseStore, ReleaseStore},
};

pub struct AppState {
    pub store: Arc<dyn ReleaseStore>,
    pub resolver: ReleaseResolver,
    pub gate: PublishGate,
    pub auth: Arc<AdminAuth>,
}

impl AppState {
    pub fn new(store: Arc<dyn ReleaseStore>, auth: Arc<AdminAuth>) -> Self {
        Self {
            resolver: ReleaseResolver::new(store.clone()),
            gate: PublishGate::new(auth.clone(), store.clone()),
            store,
            auth,
        }
    }

    pub fn from_config(config: UpdateServiceConfig) -> Result<Self> {
        let store = FsReleaseStore::open(&config.releases_dir)?;
        let auth =
            AdminAuth::new(config.auth).context("Invalid admin authentication configuration")?;
        Ok(Self::new(Arc::new(store), Arc::new(auth)))
    }
}
