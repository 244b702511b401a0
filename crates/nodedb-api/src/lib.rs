pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// All API routes, nested under `/api`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/nodes",
            get(handlers::handle_nodes_list)
                .post(handlers::handle_nodes_upsert)
                .delete(handlers::handle_nodes_clear),
        )
        .route("/nodes/by_num", get(handlers::handle_nodes_by_num))
        .route(
            "/nodes/{num}",
            get(handlers::handle_node_get).delete(handlers::handle_node_delete),
        )
        .route(
            "/my_node",
            get(handlers::handle_my_node_get)
                .put(handlers::handle_my_node_set)
                .delete(handlers::handle_my_node_clear),
        )
        .route("/metadata", axum::routing::put(handlers::handle_metadata_put))
        .route(
            "/metadata/{num}",
            get(handlers::handle_metadata_get).delete(handlers::handle_metadata_delete),
        )
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "API listening on 127.0.0.1");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;
    Ok(())
}
