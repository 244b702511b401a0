use std::path::PathBuf;

/// Failures surfaced by a [`crate::NodeStore`].
///
/// Identity conflicts and unknown sort keys are not errors; only the durable
/// store can fail.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, serde_json::Error),
    #[error("failed to serialize registry: {0}")]
    SerializeFailed(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
