//! nodedb-core: node registry records, query parameters and configuration.
//! All other nodedb crates depend on this one.

pub mod config;
pub mod node;
pub mod query;

pub use node::{
    error_public_key, MetadataRecord, MyNodeInfo, NodeRecord, NodeWithMetadata, UserIdentity,
    ERROR_PUBLIC_KEY,
};
pub use query::{NodeQuery, NodeSort};
