//! Single entry point for the host
//!
//! Must run once at startup, before the webview opens its storage files.
//! Nothing here returns an error: every failure ends up in the
//! [`MigrationReport`] and the debug log, and the host carries on.

use std::path::Path;

use crate::config::{MigrationConfig, Preferences};
use crate::layout::StorageLayout;
use crate::local_storage::LocalStorageMigrator;
use crate::outcome::{MigrationOutcome, MigrationReport};
use crate::websql::WebSqlMigrator;
use crate::MigrationError;

/// Resolve configuration from the host's preferences and migrate.
///
/// Invalid preferences fail both migrators rather than falling back to
/// defaults, which could copy data to an origin the app never serves.
pub fn run_migration_with_preferences<P: Preferences + ?Sized>(
    data_root: &Path,
    prefs: &P,
) -> MigrationReport {
    match MigrationConfig::from_preferences(prefs) {
        Ok(config) => run_migration(data_root, &config),
        Err(e) => {
            tracing::warn!(error = %e, "Storage migration not attempted: invalid configuration");
            let reason = match &e {
                MigrationError::InvalidConfig(reason) => reason.clone(),
                other => other.to_string(),
            };
            MigrationReport {
                local_storage: MigrationOutcome::Failed(e),
                websql: Some(MigrationOutcome::Failed(MigrationError::InvalidConfig(reason))),
            }
        }
    }
}

pub fn run_migration(data_root: &Path, config: &MigrationConfig) -> MigrationReport {
    let layout = StorageLayout::new(data_root);
    tracing::debug!(
        from = %config.previous,
        to = %config.target,
        root = %data_root.display(),
        rewrite_mode = config.rewrite_mode.as_str(),
        "Starting storage migration"
    );

    let local_storage = LocalStorageMigrator::new(config).migrate_at(&layout);
    log_outcome("localStorage", &local_storage);

    let websql = config.migrate_websql.then(|| {
        let outcome = WebSqlMigrator::new(config).migrate_at(&layout);
        log_outcome("WebSQL", &outcome);
        outcome
    });

    MigrationReport {
        local_storage,
        websql,
    }
}

fn log_outcome(store: &str, outcome: &MigrationOutcome) {
    match outcome {
        MigrationOutcome::Skipped(reason) => {
            tracing::debug!(store, %reason, "Storage migration skipped");
        }
        MigrationOutcome::Migrated(count) => {
            tracing::info!(store, count, "Storage migration completed");
        }
        MigrationOutcome::Failed(e) => {
            tracing::warn!(store, error = %e, "Storage migration failed");
        }
    }
}
