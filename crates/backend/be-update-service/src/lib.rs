//! Ledger Update Service
//!
//! Serves the latest release of each channel (`stable`, `beta`) to desktop
//! clients and accepts new releases from an authenticated admin. Releases are
//! immutable once published; each channel's latest pointer only ever moves to
//! a higher version.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

mod analytics;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod publish;
pub mod resolver;
pub mod service;
pub mod store;
pub mod types;

use service::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let login_governor = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(5)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("valid governor config");

    let update_routes = Router::new()
        .route("/updates/latest", get(handlers::get_default_latest_handler))
        .route("/updates/latest/{channel}", get(handlers::get_latest_handler))
        .route(
            "/updates/releases/{channel}",
            get(handlers::list_releases_handler),
        )
        .route("/updates/version/{version}", get(handlers::get_version_handler))
        .route(
            "/updates/check/{channel}/{platform}/{current_version}",
            get(handlers::check_update_handler),
        );

    let login_route = Router::new()
        .route("/admin/login", post(handlers::login_handler))
        .layer(GovernorLayer::new(Arc::new(login_governor)));

    let admin_routes = Router::new()
        .route("/admin/publish", post(handlers::publish_handler))
        .merge(login_route)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    update_routes
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Build the service from environment configuration and return its router.
pub fn init_update_service(config: config::UpdateServiceConfig) -> Result<Router> {
    debug!(
        "Initializing update service with releases in {}",
        config.releases_dir.display()
    );

    let state = Arc::new(
        AppState::from_config(config).context("Failed to create update service state")?,
    );

    Ok(create_router(state))
}

pub use config::UpdateServiceConfig;
pub use error::{ErrorResponse, UpdateServiceError};
pub use publish::{PublishGate, PublishedRelease, ValidatedRelease, validate_request};
pub use resolver::ReleaseResolver;
pub use store::{
    FsReleaseStore, MemoryReleaseStore, PointerUpdate, ReleaseListing, ReleaseStore,
};
pub use types::{PublishRequest, PublishResponse, ReleasePayload};
