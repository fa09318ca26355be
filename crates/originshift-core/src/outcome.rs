//! Typed results of a migration run

use crate::MigrationError;

/// Why a migrator had nothing to do. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The localStorage LevelDB directory does not exist.
    StoreMissing,
    /// The new origin's meta key is present: migration already ran.
    AlreadyMigrated,
    /// `Databases.db` is absent.
    ReferenceDbMissing,
    /// The previous origin's WebSQL directory is absent.
    LegacyDirMissing,
    /// A WebSQL directory for the new origin already exists.
    TargetDirExists,
    /// Previous and new origin are identical.
    SameOrigin,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::StoreMissing => "store directory not found",
            SkipReason::AlreadyMigrated => "new origin already initialized",
            SkipReason::ReferenceDbMissing => "reference database not found",
            SkipReason::LegacyDirMissing => "legacy directory not found",
            SkipReason::TargetDirExists => "target directory already exists",
            SkipReason::SameOrigin => "previous and new origin are the same",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub enum MigrationOutcome {
    Skipped(SkipReason),
    /// Records written (localStorage) or tracker rows updated (WebSQL).
    Migrated(usize),
    Failed(MigrationError),
}

impl MigrationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, MigrationOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, MigrationOutcome::Skipped(_))
    }

    pub fn migrated_count(&self) -> Option<usize> {
        match self {
            MigrationOutcome::Migrated(count) => Some(*count),
            _ => None,
        }
    }
}

impl From<crate::Result<MigrationOutcome>> for MigrationOutcome {
    fn from(result: crate::Result<MigrationOutcome>) -> Self {
        result.unwrap_or_else(MigrationOutcome::Failed)
    }
}

impl std::fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            MigrationOutcome::Migrated(count) => write!(f, "migrated ({} records)", count),
            MigrationOutcome::Failed(e) => write!(f, "failed ({})", e),
        }
    }
}

/// Outcomes of both migrators from one coordinator run.
#[derive(Debug)]
pub struct MigrationReport {
    pub local_storage: MigrationOutcome,
    /// `None` when the deployment has no WebSQL to migrate.
    pub websql: Option<MigrationOutcome>,
}

impl MigrationReport {
    pub fn has_failures(&self) -> bool {
        self.local_storage.is_failure() || self.websql.as_ref().is_some_and(|o| o.is_failure())
    }
}
