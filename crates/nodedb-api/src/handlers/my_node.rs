//! /my_node handlers for the local device's identity.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use nodedb_core::node::MyNodeInfo;

use super::{store_error, ApiError, ApiState};

pub async fn handle_my_node_get(
    State(state): State<ApiState>,
) -> Result<Json<MyNodeInfo>, ApiError> {
    match state.registry.my_node_info().map_err(store_error)? {
        Some(info) => Ok(Json(info)),
        None => Err((StatusCode::NOT_FOUND, "local node info not set".to_string())),
    }
}

pub async fn handle_my_node_set(
    State(state): State<ApiState>,
    Json(info): Json<MyNodeInfo>,
) -> Result<StatusCode, ApiError> {
    state.registry.set_my_node_info(info).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_my_node_clear(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    state.registry.clear_my_node_info().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
