//! WebSQL migration
//!
//! Moves the previous origin's WebSQL databases to the new origin in two
//! steps: repoint the `Databases.db` tracker rows, then rename the
//! per-origin directory. The steps are not atomic; a [`Journal`] brackets
//! them so an interrupted run is finished on the next start.
//!
//! A journal that cannot be parsed is discarded and the run starts over from
//! the usual preconditions; repointing the rows is safe to repeat.
//!
//! Residual risk: if the tracker already holds a row for the new token with
//! the same database name, the update hits the `(origin, name)` unique index.
//! That run fails with the journal kept, and so does every later one until
//! the conflicting row is removed.

use originshift_storage::ReferenceDatabase;
use std::fs;

use crate::config::MigrationConfig;
use crate::journal::{Journal, JournalEntry};
use crate::layout::StorageLayout;
use crate::outcome::{MigrationOutcome, SkipReason};
use crate::{MigrationError, Result};

pub struct WebSqlMigrator<'a> {
    config: &'a MigrationConfig,
}

impl<'a> WebSqlMigrator<'a> {
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self { config }
    }

    pub fn migrate_at(&self, layout: &StorageLayout) -> MigrationOutcome {
        self.try_migrate(layout).into()
    }

    fn try_migrate(&self, layout: &StorageLayout) -> Result<MigrationOutcome> {
        let reference = layout.reference_db();
        if !reference.is_file() {
            tracing::debug!(path = %reference.display(), "Databases.db not found; nothing to migrate");
            return Ok(MigrationOutcome::Skipped(SkipReason::ReferenceDbMissing));
        }

        let journal = Journal::new(layout.journal());
        match journal.read() {
            Ok(Some(entry)) => return self.resume(layout, &journal, entry),
            Ok(None) => {}
            Err(MigrationError::Journal(e)) => {
                tracing::debug!(path = %journal.path().display(), error = %e, "Discarding unreadable WebSQL journal");
                journal.clear()?;
            }
            Err(e) => return Err(e),
        }

        let from = self.config.legacy_directory_token();
        let to = self.config.target_directory_token();
        if from == to {
            return Ok(MigrationOutcome::Skipped(SkipReason::SameOrigin));
        }

        let legacy = layout.websql_dir(&from);
        if !legacy.exists() {
            tracing::debug!(path = %legacy.display(), "Legacy WebSQL directory not found");
            return Ok(MigrationOutcome::Skipped(SkipReason::LegacyDirMissing));
        }

        let target = layout.websql_dir(&to);
        if target.exists() {
            tracing::debug!(path = %target.display(), "Target WebSQL directory exists; skipping");
            return Ok(MigrationOutcome::Skipped(SkipReason::TargetDirExists));
        }

        let entry = JournalEntry::new(from, to);
        journal.write(&entry)?;
        self.apply(layout, &journal, &entry)
    }

    fn resume(
        &self,
        layout: &StorageLayout,
        journal: &Journal,
        entry: JournalEntry,
    ) -> Result<MigrationOutcome> {
        tracing::debug!(
            from = %entry.from,
            to = %entry.to,
            started_at = %entry.started_at.to_rfc3339(),
            "Resuming interrupted WebSQL migration"
        );

        if !layout.websql_dir(&entry.from).exists() && !layout.websql_dir(&entry.to).exists() {
            journal.clear()?;
            return Err(MigrationError::Interrupted {
                from: entry.from,
                to: entry.to,
            });
        }

        self.apply(layout, journal, &entry)
    }

    /// Run both steps for `entry`, clearing the journal only when both hold.
    fn apply(
        &self,
        layout: &StorageLayout,
        journal: &Journal,
        entry: &JournalEntry,
    ) -> Result<MigrationOutcome> {
        let mut db = ReferenceDatabase::open(layout.reference_db())?;
        let result = Self::repoint_and_rename(&mut db, layout, entry);
        let closed = db.close();

        let rows = result?;
        closed?;
        journal.clear()?;

        tracing::debug!(from = %entry.from, to = %entry.to, rows, "Migrated WebSQL directory");
        Ok(MigrationOutcome::Migrated(rows))
    }

    fn repoint_and_rename(
        db: &mut ReferenceDatabase,
        layout: &StorageLayout,
        entry: &JournalEntry,
    ) -> Result<usize> {
        let rows = db.rename_origin(&entry.from, &entry.to)?;

        let legacy = layout.websql_dir(&entry.from);
        let target = layout.websql_dir(&entry.to);
        // Already renamed by an earlier, interrupted run.
        if target.exists() {
            return Ok(rows);
        }

        // The tracker rows now name `to`; on failure the journal stays so the
        // rename is retried next start.
        fs::rename(&legacy, &target).map_err(|source| MigrationError::RenameFailed {
            from: legacy,
            to: target,
            source,
        })?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::Origin;
    use std::path::Path;

    fn config() -> MigrationConfig {
        MigrationConfig::new(
            Origin::new("file", "", ""),
            Origin::new("http", "localhost", "8080"),
        )
    }

    fn seed(root: &Path) -> StorageLayout {
        let layout = StorageLayout::new(root);
        fs::create_dir_all(layout.websql_dir("file__0")).unwrap();
        fs::write(layout.websql_dir("file__0").join("1"), b"sqlite").unwrap();

        let mut db = ReferenceDatabase::create(layout.reference_db()).unwrap();
        db.insert_database("file__0", "notes", "Notes", 1024).unwrap();
        db.close().unwrap();
        layout
    }

    fn origins(layout: &StorageLayout) -> Vec<String> {
        let mut db = ReferenceDatabase::open(layout.reference_db()).unwrap();
        let origins = db.origins().unwrap();
        db.close().unwrap();
        origins
    }

    #[test]
    fn test_happy_path_then_skip() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        let config = config();

        let outcome = WebSqlMigrator::new(&config).migrate_at(&layout);
        assert_eq!(outcome.migrated_count(), Some(1));
        assert_eq!(origins(&layout), vec!["http_localhost_8080".to_string()]);
        assert!(layout.websql_dir("http_localhost_8080").join("1").exists());
        assert!(!layout.websql_dir("file__0").exists());
        assert!(!layout.journal().exists());

        let again = WebSqlMigrator::new(&config).migrate_at(&layout);
        assert!(again.is_skipped());
    }

    #[test]
    fn test_skips_without_reference_db() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        fs::create_dir_all(layout.websql_dir("file__0")).unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::ReferenceDbMissing)
        ));
        assert!(layout.websql_dir("file__0").exists());
    }

    #[test]
    fn test_skips_without_legacy_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        fs::remove_dir_all(layout.websql_dir("file__0")).unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::LegacyDirMissing)
        ));
        assert_eq!(origins(&layout), vec!["file__0".to_string()]);
    }

    #[test]
    fn test_skips_when_target_exists() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        fs::create_dir_all(layout.websql_dir("http_localhost_8080")).unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert!(matches!(
            outcome,
            MigrationOutcome::Skipped(SkipReason::TargetDirExists)
        ));
        assert_eq!(origins(&layout), vec!["file__0".to_string()]);
        assert!(layout.websql_dir("file__0").exists());
    }

    #[test]
    fn test_resumes_after_row_update_without_rename() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());

        // State left by a crash between the two steps.
        let mut db = ReferenceDatabase::open(layout.reference_db()).unwrap();
        db.rename_origin("file__0", "http_localhost_8080").unwrap();
        db.close().unwrap();
        Journal::new(layout.journal())
            .write(&JournalEntry::new("file__0", "http_localhost_8080"))
            .unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert_eq!(outcome.migrated_count(), Some(0));
        assert!(layout.websql_dir("http_localhost_8080").exists());
        assert!(!layout.websql_dir("file__0").exists());
        assert_eq!(origins(&layout), vec!["http_localhost_8080".to_string()]);
        assert!(!layout.journal().exists());
    }

    #[test]
    fn test_resume_after_rename_only_clears_journal() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        fs::rename(
            layout.websql_dir("file__0"),
            layout.websql_dir("http_localhost_8080"),
        )
        .unwrap();
        Journal::new(layout.journal())
            .write(&JournalEntry::new("file__0", "http_localhost_8080"))
            .unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert_eq!(outcome.migrated_count(), Some(1));
        assert_eq!(origins(&layout), vec!["http_localhost_8080".to_string()]);
        assert!(!layout.journal().exists());
    }

    #[test]
    fn test_unresumable_journal_fails_once() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        Journal::new(layout.journal())
            .write(&JournalEntry::new("https_gone.example", "http_localhost_8080"))
            .unwrap();

        let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert!(matches!(
            outcome,
            MigrationOutcome::Failed(MigrationError::Interrupted { .. })
        ));
        assert!(!layout.journal().exists());

        let next = WebSqlMigrator::new(&config()).migrate_at(&layout);
        assert_eq!(next.migrated_count(), Some(1));
    }

    #[test]
    fn test_unreadable_journal_is_discarded() {
        for contents in [&b""[..], &b"{\"from\": \"file__0\""[..]] {
            let dir = tempfile::tempdir().unwrap();
            let layout = seed(dir.path());
            fs::write(layout.journal(), contents).unwrap();

            let outcome = WebSqlMigrator::new(&config()).migrate_at(&layout);
            assert_eq!(outcome.migrated_count(), Some(1));
            assert!(layout.websql_dir("http_localhost_8080").exists());
            assert!(!layout.websql_dir("file__0").exists());
            assert!(!layout.journal().exists());
        }
    }

    #[test]
    fn test_rename_failure_keeps_journal() {
        let dir = tempfile::tempdir().unwrap();
        let layout = seed(dir.path());
        let mut config = config();
        // A target nested under a missing parent makes the rename fail.
        config.target = Origin::new("http", "missing/child", "");

        let outcome = WebSqlMigrator::new(&config).migrate_at(&layout);
        assert!(matches!(
            outcome,
            MigrationOutcome::Failed(MigrationError::RenameFailed { .. })
        ));
        assert!(layout.journal().exists());
        assert!(layout.websql_dir("file__0").exists());
        assert_eq!(origins(&layout), vec!["http_missing/child".to_string()]);
    }
}
