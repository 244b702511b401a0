//! The node registry callers use.
//!
//! Writes go through the [`UpsertPipeline`]; reads take a snapshot from the
//! store and run it through [`crate::query`]. The registry holds no state of
//! its own beyond handles to those two.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use nodedb_core::node::{MetadataRecord, MyNodeInfo, NodeRecord, NodeWithMetadata};
use nodedb_core::query::NodeQuery;

use crate::error::Result;
use crate::query;
use crate::store::NodeStore;
use crate::upsert::UpsertPipeline;

#[derive(Clone)]
pub struct NodeRegistry {
    store: Arc<dyn NodeStore>,
    upserts: UpsertPipeline,
}

impl NodeRegistry {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            upserts: UpsertPipeline::new(store.clone()),
            store,
        }
    }

    // ── Local device ─────────────────────────────────────────────────────────

    pub fn my_node_info(&self) -> Result<Option<MyNodeInfo>> {
        self.store.my_node_info()
    }

    pub fn set_my_node_info(&self, info: MyNodeInfo) -> Result<()> {
        tracing::info!(my_node_num = info.my_node_num, "local node info updated");
        self.store.set_my_node_info(info)
    }

    pub fn clear_my_node_info(&self) -> Result<()> {
        tracing::info!("local node info cleared");
        self.store.clear_my_node_info()
    }

    fn self_num(&self) -> Result<Option<i32>> {
        Ok(self.store.my_node_info()?.map(|info| info.my_node_num))
    }

    // ── Nodes ────────────────────────────────────────────────────────────────

    /// The node with `num` joined with its metadata, or `None`.
    pub fn node_by_num(&self, num: i32) -> Result<Option<NodeWithMetadata>> {
        let Some(node) = self.store.get_node(num)? else {
            return Ok(None);
        };
        let metadata = self.store.get_metadata(num)?;
        Ok(Some(NodeWithMetadata { node, metadata }))
    }

    pub fn upsert(&self, node: NodeRecord) -> Result<()> {
        self.upserts.upsert_one(node)
    }

    pub fn upsert_all(&self, nodes: Vec<NodeRecord>) -> Result<()> {
        self.upserts.upsert_many(nodes)
    }

    pub fn delete_node(&self, num: i32) -> Result<()> {
        tracing::info!(num, "deleting node");
        self.store.delete_node(num)
    }

    /// Remove every node. Metadata and local node info are kept.
    pub fn clear_all(&self) -> Result<()> {
        tracing::info!("clearing node registry");
        self.store.delete_all_nodes()
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn metadata(&self, num: i32) -> Result<Option<MetadataRecord>> {
        self.store.get_metadata(num)
    }

    pub fn upsert_metadata(&self, meta: MetadataRecord) -> Result<()> {
        self.store.put_metadata(meta)
    }

    pub fn delete_metadata(&self, num: i32) -> Result<()> {
        self.store.delete_metadata(num)
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Filtered, ordered listing. The self-node always comes first.
    pub fn list(&self, query: &NodeQuery) -> Result<Vec<NodeRecord>> {
        if !query.sort.is_recognized() {
            tracing::debug!(sort = %query.sort, "unrecognized sort key, ordering by recency");
        }
        let self_num = self.self_num()?;
        let snapshot = self.store.nodes_snapshot()?;
        Ok(query::list(snapshot, query, self_num))
    }

    /// Every node with its metadata, self-node first then most recent.
    pub fn nodes_by_num(&self) -> Result<Vec<NodeWithMetadata>> {
        let self_num = self.self_num()?;
        let snapshot = self.store.nodes_snapshot()?;
        query::by_num(snapshot, self_num)
            .into_iter()
            .map(|node| -> Result<NodeWithMetadata> {
                let metadata = self.store.get_metadata(node.num)?;
                Ok(NodeWithMetadata { node, metadata })
            })
            .collect()
    }

    /// Keep `list(query)` up to date.
    ///
    /// The returned receiver holds the current listing and is refreshed on
    /// every store change. The refresh task stops once every receiver is
    /// dropped. Must be called inside a Tokio runtime.
    pub fn subscribe_list(&self, query: NodeQuery) -> Result<watch::Receiver<Vec<NodeRecord>>> {
        // Subscribe before the first read so no change falls in between.
        let mut events = self.store.subscribe();
        let (tx, rx) = watch::channel(self.list(&query)?);
        let registry = self.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    event = events.recv() => match event {
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "live node list lagged, refreshing");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }

                match registry.list(&query) {
                    Ok(nodes) => {
                        if tx.send(nodes).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to refresh live node list");
                    }
                }
            }
            tracing::debug!(sort = %query.sort, "live node list stopped");
        });

        Ok(rx)
    }
}
