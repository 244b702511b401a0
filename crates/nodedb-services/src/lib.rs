//! nodedb-services: identity pinning, the node store, upserts and listing
//! queries behind [`NodeRegistry`].

pub mod error;
pub mod identity;
pub mod query;
pub mod registry;
pub mod store;
pub mod upsert;

pub use error::StoreError;
pub use registry::NodeRegistry;
pub use store::{MemoryNodeStore, NodeStore, StoreEvent};
pub use upsert::UpsertPipeline;
