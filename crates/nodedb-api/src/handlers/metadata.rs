//! /metadata handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use nodedb_core::node::MetadataRecord;

use super::{parse_num, store_error, ApiError, ApiState};

pub async fn handle_metadata_get(
    State(state): State<ApiState>,
    Path(num): Path<String>,
) -> Result<Json<MetadataRecord>, ApiError> {
    let num = parse_num(&num)?;
    match state.registry.metadata(num).map_err(store_error)? {
        Some(meta) => Ok(Json(meta)),
        None => Err((StatusCode::NOT_FOUND, format!("no metadata for node {num}"))),
    }
}

pub async fn handle_metadata_put(
    State(state): State<ApiState>,
    Json(meta): Json<MetadataRecord>,
) -> Result<StatusCode, ApiError> {
    state.registry.upsert_metadata(meta).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_metadata_delete(
    State(state): State<ApiState>,
    Path(num): Path<String>,
) -> Result<StatusCode, ApiError> {
    let num = parse_num(&num)?;
    state.registry.delete_metadata(num).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
