//! Migration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Storage error: {0}")]
    Storage(#[from] originshift_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Journal error: {0}")]
    Journal(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tracker row already points at `to`; the directory still carries the old name.
    #[error("Renaming {} to {} failed: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Interrupted WebSQL migration {from} -> {to} cannot be resumed: neither directory exists")]
    Interrupted { from: String, to: String },
}
