//! Durable node store.
//!
//! [`NodeStore`] is the storage surface the registry is built on: keyed
//! insert-or-replace, deletes, whole-collection snapshots, and a change
//! notification channel. [`MemoryNodeStore`] keeps everything in `DashMap`s
//! and, when constructed with a path, rewrites a JSON file on every mutation
//! and reloads it on startup.
//!
//! Records are always replaced whole, so a snapshot never contains a
//! half-written record.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use nodedb_core::node::{MetadataRecord, MyNodeInfo, NodeRecord};

use crate::error::{Result, StoreError};

/// Capacity of the change notification channel. Slow subscribers lag and
/// are expected to re-read a snapshot.
const EVENT_CAPACITY: usize = 256;

/// A change committed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NodesUpserted(Vec<i32>),
    NodeDeleted(i32),
    NodesCleared,
    MetadataUpserted(i32),
    MetadataDeleted(i32),
    MyNodeChanged,
}

/// Storage collaborator for the registry.
pub trait NodeStore: Send + Sync {
    fn get_node(&self, num: i32) -> Result<Option<NodeRecord>>;

    /// Insert or replace by `num`.
    fn put_node(&self, node: NodeRecord) -> Result<()>;

    /// Insert or replace each record by `num`.
    fn put_nodes(&self, nodes: Vec<NodeRecord>) -> Result<()>;

    fn delete_node(&self, num: i32) -> Result<()>;

    fn delete_all_nodes(&self) -> Result<()>;

    /// Every node currently stored, in no particular order.
    fn nodes_snapshot(&self) -> Result<Vec<NodeRecord>>;

    fn get_metadata(&self, num: i32) -> Result<Option<MetadataRecord>>;

    fn put_metadata(&self, meta: MetadataRecord) -> Result<()>;

    fn delete_metadata(&self, num: i32) -> Result<()>;

    fn my_node_info(&self) -> Result<Option<MyNodeInfo>>;

    fn set_my_node_info(&self, info: MyNodeInfo) -> Result<()>;

    fn clear_my_node_info(&self) -> Result<()>;

    /// Receive a [`StoreEvent`] for every committed change.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// On-disk layout of a persisted store.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedRegistry {
    my_node: Option<MyNodeInfo>,
    nodes: Vec<NodeRecord>,
    metadata: Vec<MetadataRecord>,
}

/// In-memory [`NodeStore`], optionally mirrored to a JSON file.
#[derive(Clone)]
pub struct MemoryNodeStore {
    nodes: Arc<DashMap<i32, NodeRecord>>,
    metadata: Arc<DashMap<i32, MetadataRecord>>,
    my_node: Arc<RwLock<Option<MyNodeInfo>>>,
    persist_path: Arc<Option<PathBuf>>,
    /// Serializes file rewrites so the last writer reflects the latest state.
    persist_lock: Arc<Mutex<()>>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for MemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a store that persists to the given file path.
    /// Loads existing records from disk if the file exists.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::build(Some(path.into()));
        store.load_from_disk()?;
        Ok(store)
    }

    fn build(persist_path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            nodes: Arc::new(DashMap::new()),
            metadata: Arc::new(DashMap::new()),
            my_node: Arc::new(RwLock::new(None)),
            persist_path: Arc::new(persist_path),
            persist_lock: Arc::new(Mutex::new(())),
            events,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn notify(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Persist an applied change and announce it.
    ///
    /// The in-memory change stays applied when the file write fails, so the
    /// event is sent either way and subscribers never lag behind readers.
    /// The write error is still returned.
    fn commit(&self, event: StoreEvent) -> Result<()> {
        let saved = self.save_to_disk();
        if let Err(e) = &saved {
            tracing::warn!(error = %e, ?event, "node store change not persisted");
        }
        self.notify(event);
        saved
    }

    fn read_my_node(&self) -> Option<MyNodeInfo> {
        match self.my_node.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_my_node(&self, value: Option<MyNodeInfo>) {
        match self.my_node.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    /// Rewrite the backing file. Written to a temp file, then renamed.
    fn save_to_disk(&self) -> Result<()> {
        let Some(path) = self.persist_path.as_ref() else {
            return Ok(());
        };
        let _guard = self
            .persist_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut nodes: Vec<NodeRecord> = self.nodes.iter().map(|e| e.value().clone()).collect();
        nodes.sort_by_key(|n| n.num);
        let mut metadata: Vec<MetadataRecord> =
            self.metadata.iter().map(|e| e.value().clone()).collect();
        metadata.sort_by_key(|m| m.num);

        let snapshot = PersistedRegistry {
            my_node: self.read_my_node(),
            nodes,
            metadata,
        };
        let json = serde_json::to_vec_pretty(&snapshot).map_err(StoreError::SerializeFailed)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::WriteFailed(parent.to_path_buf(), e))?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::WriteFailed(tmp.clone(), e))?;
        std::fs::rename(&tmp, path).map_err(|e| StoreError::WriteFailed(path.clone(), e))?;
        Ok(())
    }

    /// Load records from disk. Called once during construction.
    fn load_from_disk(&self) -> Result<()> {
        let Some(path) = self.persist_path.as_ref() else {
            return Ok(());
        };
        let text = match std::fs::read(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::ReadFailed(path.clone(), e)),
        };
        let persisted: PersistedRegistry =
            serde_json::from_slice(&text).map_err(|e| StoreError::ParseFailed(path.clone(), e))?;

        let node_count = persisted.nodes.len();
        for node in persisted.nodes {
            self.nodes.insert(node.num, node);
        }
        for meta in persisted.metadata {
            self.metadata.insert(meta.num, meta);
        }
        self.write_my_node(persisted.my_node);

        tracing::info!(
            nodes = node_count,
            metadata = self.metadata.len(),
            path = %path.display(),
            "loaded persisted node registry"
        );
        Ok(())
    }
}

impl NodeStore for MemoryNodeStore {
    fn get_node(&self, num: i32) -> Result<Option<NodeRecord>> {
        Ok(self.nodes.get(&num).map(|n| n.value().clone()))
    }

    fn put_node(&self, node: NodeRecord) -> Result<()> {
        let num = node.num;
        self.nodes.insert(num, node);
        self.commit(StoreEvent::NodesUpserted(vec![num]))
    }

    fn put_nodes(&self, nodes: Vec<NodeRecord>) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let nums: Vec<i32> = nodes.iter().map(|n| n.num).collect();
        for node in nodes {
            self.nodes.insert(node.num, node);
        }
        self.commit(StoreEvent::NodesUpserted(nums))
    }

    fn delete_node(&self, num: i32) -> Result<()> {
        if self.nodes.remove(&num).is_none() {
            return Ok(());
        }
        self.commit(StoreEvent::NodeDeleted(num))
    }

    fn delete_all_nodes(&self) -> Result<()> {
        self.nodes.clear();
        self.commit(StoreEvent::NodesCleared)
    }

    fn nodes_snapshot(&self) -> Result<Vec<NodeRecord>> {
        Ok(self.nodes.iter().map(|e| e.value().clone()).collect())
    }

    fn get_metadata(&self, num: i32) -> Result<Option<MetadataRecord>> {
        Ok(self.metadata.get(&num).map(|m| m.value().clone()))
    }

    fn put_metadata(&self, meta: MetadataRecord) -> Result<()> {
        let num = meta.num;
        self.metadata.insert(num, meta);
        self.commit(StoreEvent::MetadataUpserted(num))
    }

    fn delete_metadata(&self, num: i32) -> Result<()> {
        if self.metadata.remove(&num).is_none() {
            return Ok(());
        }
        self.commit(StoreEvent::MetadataDeleted(num))
    }

    fn my_node_info(&self) -> Result<Option<MyNodeInfo>> {
        Ok(self.read_my_node())
    }

    fn set_my_node_info(&self, info: MyNodeInfo) -> Result<()> {
        self.write_my_node(Some(info));
        self.commit(StoreEvent::MyNodeChanged)
    }

    fn clear_my_node_info(&self) -> Result<()> {
        self.write_my_node(None);
        self.commit(StoreEvent::MyNodeChanged)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
