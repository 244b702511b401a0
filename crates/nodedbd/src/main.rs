//! nodedbd: node registry daemon.

use std::sync::Arc;

use anyhow::{Context, Result};

use nodedb_core::config::NodeDbConfig;
use nodedb_services::{MemoryNodeStore, NodeRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = NodeDbConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = NodeDbConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        NodeDbConfig::default()
    });
    tracing::info!(config = %NodeDbConfig::file_path().display(), "nodedbd starting");

    // Store
    let store = if config.store.persist {
        let path = config.store.path.clone();
        let store = MemoryNodeStore::with_persistence(path.clone())
            .with_context(|| format!("failed to open node store at {}", path.display()))?;
        tracing::info!(path = %path.display(), nodes = store.node_count(), "node store ready");
        store
    } else {
        tracing::warn!("persistence disabled, registry is in-memory only");
        MemoryNodeStore::new()
    };
    let registry = NodeRegistry::new(Arc::new(store));

    match registry.my_node_info()? {
        Some(info) => tracing::info!(my_node_num = info.my_node_num, "local node known"),
        None => tracing::info!("local node not yet reported"),
    }

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    // Follows the default listing and logs its size as nodes come and go.
    let mut live = registry.subscribe_list(config.query.to_query())?;
    let listing_printer = tokio::spawn(async move {
        tracing::info!(count = live.borrow().len(), "node listing snapshot");
        while live.changed().await.is_ok() {
            let nodes = live.borrow_and_update();
            tracing::debug!(
                count = nodes.len(),
                first = nodes.first().map(|n| n.user_id_hex()).unwrap_or_default(),
                "node listing changed"
            );
        }
    });

    let api_task = {
        let state = nodedb_api::ApiState {
            registry: registry.clone(),
            query_defaults: config.query.clone(),
            shutdown_tx: shutdown_tx.clone(),
        };
        let port = config.api.port;
        tokio::spawn(async move {
            if let Err(e) = nodedb_api::serve(state, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv()  => tracing::info!("shutting down"),
        r = api_task            => tracing::error!("API task exited: {:?}", r),
        r = listing_printer     => tracing::error!("listing printer exited: {:?}", r),
    }

    Ok(())
}
