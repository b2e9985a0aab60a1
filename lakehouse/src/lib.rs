pub mod api;
pub mod catalog;
pub mod processor;
pub mod services;
pub mod utils;

use axum::Router;
use axum::http::{HeaderValue, Method};
use common::Result;
use common::config::{ApiConfig, Settings};
use services::lakehouse::LakehouseService;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Builds the HTTP application: routes plus CORS and request tracing.
pub fn build_app(service: Arc<LakehouseService>, api: &ApiConfig) -> Router {
    let allow_origin = if api.cors_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(api.cors_origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin"))
                .ok()
        }))
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    api::routes(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Optionally rebuilds the lake, then serves the read API until shutdown.
pub async fn run_server(settings: &Settings, rebuild: bool) -> Result<()> {
    if rebuild {
        let transform_settings = settings.clone();
        let summary = tokio::task::spawn_blocking(move || etl::run_transform(&transform_settings))
            .await
            .map_err(|e| common::Error::Other(format!("transform task failed: {}", e)))?;
        if summary.has_failures() {
            warn!(failed = summary.failed.len(), "Some sources failed to rebuild");
        }
    }

    let service = Arc::new(LakehouseService::new(settings));
    let app = build_app(service, &settings.api);

    let addr = format!("{}:{}", settings.api.host, settings.api.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        processed_dir = %settings.paths.processed_dir.display(),
        "Lakehouse API server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
