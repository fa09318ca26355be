//! OriginShift Storage Layer
//!
//! Adapters over the two stores a webview keeps on disk:
//! the LevelDB database backing `localStorage` and the SQLite
//! tracker (`Databases.db`) that indexes per-origin WebSQL directories.
//! Neither adapter keeps a handle alive past a single migration attempt.

mod error;
mod kv;
mod leveldb;
mod memory;
mod metadata;

pub use error::StorageError;
pub use kv::{KeyValueStore, Record, Records, WriteBatch};
pub use leveldb::LevelDbStore;
pub use memory::MemoryStore;
pub use metadata::ReferenceDatabase;

pub type Result<T> = std::result::Result<T, StorageError>;
