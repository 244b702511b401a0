//! HTTP API handlers exposing the node registry as JSON.

pub mod metadata;
pub mod my_node;
pub mod nodes;

use axum::http::StatusCode;

use nodedb_core::config::QueryDefaults;
use nodedb_services::{NodeRegistry, StoreError};

#[derive(Clone)]
pub struct ApiState {
    pub registry: NodeRegistry,
    /// Listing parameters applied when a request leaves them out.
    pub query_defaults: QueryDefaults,
    /// Signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

type ApiError = (StatusCode, String);

/// Store failures are surfaced as-is.
fn store_error(e: StoreError) -> ApiError {
    tracing::warn!(error = %e, "node store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Parse a node number given as decimal (signed or unsigned) or `!xxxxxxxx`.
fn parse_num(text: &str) -> Result<i32, ApiError> {
    let bad = || (StatusCode::BAD_REQUEST, format!("invalid node number: {text}"));
    if let Some(hex) = text.strip_prefix('!') {
        return u32::from_str_radix(hex, 16)
            .map(|n| n as i32)
            .map_err(|_| bad());
    }
    text.parse::<i32>()
        .or_else(|_| text.parse::<u32>().map(|n| n as i32))
        .map_err(|_| bad())
}

// Re-export handler functions for use in router setup.
pub use metadata::{handle_metadata_delete, handle_metadata_get, handle_metadata_put};
pub use my_node::{handle_my_node_clear, handle_my_node_get, handle_my_node_set};
pub use nodes::{
    handle_node_delete, handle_node_get, handle_nodes_by_num, handle_nodes_clear,
    handle_nodes_list, handle_nodes_upsert, handle_shutdown,
};
