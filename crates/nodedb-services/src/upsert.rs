//! Upsert pipeline: look up the stored node, pin its identity, commit.
//!
//! The lookup-resolve-commit sequence is a read-modify-write, so it runs
//! under a lock scoped to the node number. Two sightings of the same node
//! can never both resolve against the same stale identity.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use nodedb_core::node::NodeRecord;

use crate::error::Result;
use crate::identity;
use crate::store::NodeStore;

/// One mutex per node number, created on first use.
#[derive(Clone, Default)]
struct KeyLocks {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    fn handle(&self, num: i32) -> Arc<Mutex<()>> {
        self.locks.entry(num).or_default().clone()
    }
}

fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The guarded value is (), so a poisoned lock carries no broken state.
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes nodes through [`identity::resolve`].
#[derive(Clone)]
pub struct UpsertPipeline {
    store: Arc<dyn NodeStore>,
    locks: KeyLocks,
}

impl UpsertPipeline {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            locks: KeyLocks::default(),
        }
    }

    /// Resolve the node's identity against the stored record and commit it.
    pub fn upsert_one(&self, mut node: NodeRecord) -> Result<()> {
        let handle = self.locks.handle(node.num);
        let _guard = acquire(&handle);

        let existing = self.store.get_node(node.num)?;
        node.user = identity::resolve(existing.as_ref().map(|n| &n.user), node.user);
        tracing::debug!(num = node.num, id = %node.user_id_hex(), new = existing.is_none(), "upsert node");
        self.store.put_node(node)
    }

    /// Same outcome as calling [`Self::upsert_one`] for each node in order.
    ///
    /// Every node is still looked up and resolved individually. The locks
    /// for all touched numbers are taken in ascending order and held until
    /// the batch is committed in a single `put_nodes`. A number repeated in
    /// the batch resolves against its earlier occurrence.
    pub fn upsert_many(&self, nodes: Vec<NodeRecord>) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        let nums: BTreeSet<i32> = nodes.iter().map(|n| n.num).collect();
        let handles: Vec<Arc<Mutex<()>>> = nums.iter().map(|&num| self.locks.handle(num)).collect();
        let _guards: Vec<MutexGuard<'_, ()>> = handles.iter().map(|h| acquire(h)).collect();

        // Records resolved earlier in this batch shadow the store.
        let mut pending: HashMap<i32, NodeRecord> = HashMap::with_capacity(nums.len());
        let mut order: Vec<i32> = Vec::with_capacity(nums.len());

        for mut node in nodes {
            let existing = match pending.get(&node.num) {
                Some(earlier) => Some(earlier.clone()),
                None => self.store.get_node(node.num)?,
            };
            node.user = identity::resolve(existing.as_ref().map(|n| &n.user), node.user);
            if !pending.contains_key(&node.num) {
                order.push(node.num);
            }
            pending.insert(node.num, node);
        }

        let resolved: Vec<NodeRecord> = order
            .into_iter()
            .filter_map(|num| pending.remove(&num))
            .collect();
        tracing::debug!(count = resolved.len(), "upsert node batch");
        self.store.put_nodes(resolved)
    }
}
