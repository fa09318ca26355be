//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key-value store error: {0}")]
    KeyValue(String),

    #[error("Store is locked by another process: {0}")]
    Locked(String),

    #[error("Store is corrupt: {0}")]
    Corrupt(String),

    #[error("Store not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Store already closed")]
    Closed,
}

impl From<rusty_leveldb::Status> for StorageError {
    fn from(status: rusty_leveldb::Status) -> Self {
        use rusty_leveldb::StatusCode;

        match status.code {
            StatusCode::LockError => StorageError::Locked(status.err),
            StatusCode::Corruption => StorageError::Corrupt(status.err),
            _ => StorageError::KeyValue(format!("{:?}: {}", status.code, status.err)),
        }
    }
}
