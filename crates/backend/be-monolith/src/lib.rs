use std::net::SocketAddr;

use axum::{Json, Router, routing::get};
use be_update_service::{UpdateServiceConfig, init_update_service};
use serde_json::json;

/// Configuration for running the monolith server.
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    pub update: UpdateServiceConfig,
    /// When this receiver gets a value, the server shuts down gracefully.
    pub shutdown: tokio::sync::watch::Receiver<()>,
}

/// Mount the health probe next to the update service routes.
pub fn build_http_router(update_router: Router) -> Router {
    let health_route = Router::new().route(
        "/health",
        get(|| async { Json(json!({ "status": "ok" })) }),
    );

    update_router.merge(health_route)
}

pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(posthog_key) = std::env::var("POSTHOG_API_KEY")
        .ok()
        .filter(|s| !s.is_empty())
    {
        match posthog_rs::init_global(posthog_key.as_str()).await {
            Ok(()) => tracing::info!("PostHog analytics initialized"),
            Err(e) => tracing::warn!("Failed to initialize PostHog: {}", e),
        }
    } else {
        tracing::info!("POSTHOG_API_KEY not set, analytics disabled");
    }

    let update_router = match init_update_service(config.update) {
        Ok(router) => router,
        Err(e) => {
            tracing::error!("Failed to initialize update service: {:#}", e);
            return Err(e.into());
        }
    };

    let http_router = build_http_router(update_router);

    tracing::info!("Starting HTTP server at {}", config.http_addr);

    let mut http_shutdown = config.shutdown.clone();
    let http_listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    let result = axum::serve(
        http_listener,
        http_router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = http_shutdown.changed().await;
        tracing::info!("Shutting down HTTP server...");
    })
    .await;

    if let Err(e) = result {
        tracing::error!("HTTP server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn health_route_is_mounted() {
        let app = build_http_router(Router::new());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }
}
