//! localStorage migration
//!
//! One forward scan of the LevelDB store stages a copy of every record in the
//! previous origin's namespace under the new origin, then commits all copies
//! as a single batch. Old records are left in place.

use originshift_storage::{KeyValueStore, LevelDbStore, WriteBatch};

use crate::config::MigrationConfig;
use crate::layout::StorageLayout;
use crate::origin::{belongs_to_namespace, meta_key, namespace_prefix, rewrite_with};
use crate::outcome::{MigrationOutcome, SkipReason};
use crate::Result;

pub struct LocalStorageMigrator<'a> {
    config: &'a MigrationConfig,
}

impl<'a> LocalStorageMigrator<'a> {
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self { config }
    }

    /// Migrate the LevelDB store found under `layout`.
    pub fn migrate_at(&self, layout: &StorageLayout) -> MigrationOutcome {
        let path = layout.local_storage_dir();
        if !path.is_dir() {
            tracing::debug!(path = %path.display(), "localStorage directory not found; nothing to migrate");
            return MigrationOutcome::Skipped(SkipReason::StoreMissing);
        }

        match LevelDbStore::open(&path) {
            Ok(mut store) => self.migrate(&mut store),
            Err(e) => MigrationOutcome::Failed(e.into()),
        }
    }

    /// Migrate an opened store. The store is closed before returning,
    /// whatever the outcome.
    pub fn migrate<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> MigrationOutcome {
        let outcome: MigrationOutcome = self.copy_namespace(store).into();

        if let Err(e) = store.close() {
            tracing::debug!(error = %e, "Closing localStorage store failed");
        }
        outcome
    }

    fn copy_namespace<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<MigrationOutcome> {
        if self.config.is_same_origin() {
            return Ok(MigrationOutcome::Skipped(SkipReason::SameOrigin));
        }

        let new_base = self.config.target.base_url();
        let new_meta = meta_key(&new_base);
        if store.contains(&new_meta)? {
            tracing::debug!(origin = %new_base, "Meta key for new origin present; skipping localStorage migration");
            return Ok(MigrationOutcome::Skipped(SkipReason::AlreadyMigrated));
        }

        let old_base = self.config.previous.base_url();
        let old_meta = meta_key(&old_base);
        let old_prefix = namespace_prefix(&old_base);

        let mut batch = WriteBatch::new();
        for record in store.records()? {
            let (key, value) = record?;
            if !belongs_to_namespace(&key, &old_prefix, &old_meta) {
                continue;
            }

            let new_key = rewrite_with(self.config.rewrite_mode, &key, &old_base, &new_base);
            tracing::trace!(
                from = %String::from_utf8_lossy(&key),
                to = %String::from_utf8_lossy(&new_key),
                "Staging localStorage key"
            );
            batch.put(new_key, value);
        }

        let staged = batch.len();
        store.write(batch)?;
        tracing::debug!(from = %old_base, to = %new_base, records = staged, "Committed localStorage batch");

        Ok(MigrationOutcome::Migrated(staged))
    }
}
