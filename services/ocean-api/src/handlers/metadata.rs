//! Field metadata handler.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    Json,
};
use ocean_grid::MetadataResponse;
use serde::Deserialize;

use super::{error::ApiError, run_blocking};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MetadataParams {
    pub field: Option<String>,
}

/// GET /api/metadata?field=salinity
pub async fn metadata_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<MetadataParams>, QueryRejection>,
) -> Result<Json<MetadataResponse>, ApiError> {
    let Query(params) = params?;
    let field = params.field.unwrap_or_else(|| "salinity".to_string());
    let metadata = run_blocking(move || state.data_service.get_metadata(&field)).await?;
    Ok(Json(metadata))
}
