//! OriginShift Core
//!
//! Migrates a webview's persisted `localStorage` and WebSQL data when the
//! page origin (scheme, host, port) changes between app versions. Without
//! it, data stored under the old origin is orphaned.
//!
//! Hosts call [`run_migration`] once at startup, before the webview opens
//! its storage. It never fails; outcomes are returned and logged.

mod config;
mod coordinator;
mod error;
mod journal;
mod layout;
mod local_storage;
mod origin;
mod outcome;
mod websql;

pub use config::{
    MigrationConfig, MigrationSettings, Preferences, DEFAULT_HOSTNAME, DEFAULT_SCHEME,
    LEGACY_WEBSQL_DIR_NAME, PREF_HOSTNAME, PREF_MIGRATE_WEBSQL, PREF_PORT, PREF_PREVIOUS_HOSTNAME,
    PREF_PREVIOUS_PORT, PREF_PREVIOUS_SCHEME, PREF_REWRITE_MODE, PREF_SCHEME,
};
pub use coordinator::{run_migration, run_migration_with_preferences};
pub use error::MigrationError;
pub use journal::{Journal, JournalEntry};
pub use layout::StorageLayout;
pub use local_storage::LocalStorageMigrator;
pub use origin::{
    base_url, belongs_to_namespace, meta_key, namespace_prefix, rewrite, rewrite_prefix,
    rewrite_with, Origin, RewriteMode, NAMESPACE_SEPARATOR,
};
pub use outcome::{MigrationOutcome, MigrationReport, SkipReason};
pub use websql::WebSqlMigrator;

pub use originshift_storage::{
    KeyValueStore, LevelDbStore, MemoryStore, ReferenceDatabase, StorageError, WriteBatch,
};

pub type Result<T> = std::result::Result<T, MigrationError>;

/// Initialize logging. Leaves an already installed subscriber in place.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
