use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::models::{DataQueryParams, RootMessage};
use crate::catalog::MetadataDescriptor;
use crate::processor::QueryResult;
use crate::services::AppError;
use crate::services::lakehouse::LakehouseService;

pub async fn root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "Renewable Energy Analytics API",
    })
}

pub async fn list_sources(
    State(service): State<Arc<LakehouseService>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(service.list_sources().await?))
}

pub async fn list_sources_with_metadata(
    State(service): State<Arc<LakehouseService>>,
) -> Result<Json<BTreeMap<String, MetadataDescriptor>>, AppError> {
    Ok(Json(service.sources_with_metadata().await?))
}

pub async fn query_source(
    Path(source_name): Path<String>,
    Query(params): Query<DataQueryParams>,
    State(service): State<Arc<LakehouseService>>,
) -> Result<Json<QueryResult>, AppError> {
    let request = params.into_filter(source_name, service.default_limit());
    debug!(request = ?request, "Data request");
    Ok(Json(service.query(&request).await?))
}

// Define all API routes
pub fn routes(service: Arc<LakehouseService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/sources", get(list_sources))
        .route("/sources_with_metadata", get(list_sources_with_metadata))
        .route("/data/{source_name}", get(query_source))
        .with_state(service)
}
