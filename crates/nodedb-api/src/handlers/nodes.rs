//! /nodes handlers: listing, lookup, upsert and delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use nodedb_core::node::{MetadataRecord, NodeRecord};
use nodedb_core::query::{NodeQuery, NodeSort};

use super::{parse_num, store_error, ApiError, ApiState};

/// A node as returned by the API.
#[derive(Serialize)]
pub struct NodeInfo {
    /// `!xxxxxxxx` form of `num`.
    pub user_id: String,
    /// The stored key is the identity-conflict sentinel.
    pub key_conflict: bool,
    /// A fix other than `(0, 0)` is known.
    pub has_position: bool,
    #[serde(flatten)]
    pub node: NodeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
}

impl NodeInfo {
    fn new(node: NodeRecord, metadata: Option<MetadataRecord>) -> Self {
        Self {
            user_id: node.user_id_hex(),
            key_conflict: node.user.has_key_conflict(),
            has_position: node.has_valid_position(),
            node,
            metadata,
        }
    }
}

#[derive(Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeInfo>,
}

// ── /nodes (GET) ──────────────────────────────────────────────────────────────

/// Query string of a listing. Missing fields use the configured defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub include_unknown: Option<bool>,
    pub hops_away_max: Option<i32>,
    pub last_heard_min: Option<i64>,
}

impl ListParams {
    pub fn into_query(self, base: NodeQuery) -> NodeQuery {
        NodeQuery {
            sort: self.sort.map(NodeSort::from).unwrap_or(base.sort),
            filter: self.filter.unwrap_or(base.filter),
            include_unknown: self.include_unknown.unwrap_or(base.include_unknown),
            hops_away_max: self.hops_away_max.unwrap_or(base.hops_away_max),
            last_heard_min: self.last_heard_min.unwrap_or(base.last_heard_min),
        }
    }
}

pub async fn handle_nodes_list(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<Json<NodesResponse>, ApiError> {
    let query = params.into_query(state.query_defaults.to_query());
    let nodes = state
        .registry
        .list(&query)
        .map_err(store_error)?
        .into_iter()
        .map(|n| NodeInfo::new(n, None))
        .collect();
    Ok(Json(NodesResponse { nodes }))
}

// ── /nodes/by_num (GET) ───────────────────────────────────────────────────────

pub async fn handle_nodes_by_num(
    State(state): State<ApiState>,
) -> Result<Json<NodesResponse>, ApiError> {
    let nodes = state
        .registry
        .nodes_by_num()
        .map_err(store_error)?
        .into_iter()
        .map(|n| NodeInfo::new(n.node, n.metadata))
        .collect();
    Ok(Json(NodesResponse { nodes }))
}

// ── /nodes/{num} (GET, DELETE) ────────────────────────────────────────────────

pub async fn handle_node_get(
    State(state): State<ApiState>,
    Path(num): Path<String>,
) -> Result<Json<NodeInfo>, ApiError> {
    let num = parse_num(&num)?;
    match state.registry.node_by_num(num).map_err(store_error)? {
        Some(found) => Ok(Json(NodeInfo::new(found.node, found.metadata))),
        None => Err((StatusCode::NOT_FOUND, format!("node {num} not found"))),
    }
}

pub async fn handle_node_delete(
    State(state): State<ApiState>,
    Path(num): Path<String>,
) -> Result<StatusCode, ApiError> {
    let num = parse_num(&num)?;
    state.registry.delete_node(num).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── /nodes (POST, DELETE) ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpsertRequest {
    pub nodes: Vec<NodeRecord>,
}

#[derive(Serialize)]
pub struct UpsertResponse {
    pub upserted: usize,
    /// Nodes whose stored key is now the conflict sentinel.
    pub key_conflicts: Vec<String>,
}

pub async fn handle_nodes_upsert(
    State(state): State<ApiState>,
    Json(req): Json<UpsertRequest>,
) -> Result<Json<UpsertResponse>, ApiError> {
    let nums: Vec<i32> = req.nodes.iter().map(|n| n.num).collect();
    let upserted = req.nodes.len();

    state.registry.upsert_all(req.nodes).map_err(store_error)?;

    let mut key_conflicts = Vec::new();
    for num in nums {
        if let Some(found) = state.registry.node_by_num(num).map_err(store_error)? {
            if found.node.user.has_key_conflict() {
                key_conflicts.push(found.node.user_id_hex());
            }
        }
    }
    key_conflicts.sort();
    key_conflicts.dedup();

    Ok(Json(UpsertResponse {
        upserted,
        key_conflicts,
    }))
}

pub async fn handle_nodes_clear(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    state.registry.clear_all().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── /daemon/shutdown (POST) ───────────────────────────────────────────────────

pub async fn handle_shutdown(State(state): State<ApiState>) -> StatusCode {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());
    StatusCode::ACCEPTED
}
