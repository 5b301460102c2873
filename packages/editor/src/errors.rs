//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] msf_parser::FormatError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failure reported by a collaborator-provided [`MappingStorage`](crate::MappingStorage)
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored value: {0}")]
    Json(#[from] serde_json::Error),
}
