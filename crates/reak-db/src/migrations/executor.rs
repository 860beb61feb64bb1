use std::collections::BTreeSet;

use reak_common::{Error, Result};
use tracing::{debug, info, warn};

use super::splitter::split_statements;
use super::store::{MigrationFile, MigrationStore};
use super::tracker::AppliedStore;
use crate::gateway::Database;

/// Result of listing and diffing, before anything is applied.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Every migration file on disk, ascending by id.
    pub candidates: Vec<MigrationFile>,
    pub applied: BTreeSet<String>,
    /// Candidates not yet applied, ascending by id.
    pub pending: Vec<MigrationFile>,
}

impl MigrationPlan {
    /// Applied ids that no longer have a file on disk.
    pub fn orphaned(&self) -> Vec<&str> {
        self.applied
            .iter()
            .filter(|id| !self.candidates.iter().any(|c| &c.id == *id))
            .map(String::as_str)
            .collect()
    }
}

/// A migration that was committed and recorded during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub id: String,
    pub statements: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    /// Candidates that were already applied before this run.
    pub skipped: usize,
}

impl MigrationReport {
    pub fn statements(&self) -> usize {
        self.applied.iter().map(|m| m.statements).sum()
    }
}

/// Sort candidates by id and drop those already applied.
pub fn pending_migrations(
    mut candidates: Vec<MigrationFile>,
    applied: &BTreeSet<String>,
) -> Vec<MigrationFile> {
    candidates.sort_by(|a, b| a.id.cmp(&b.id));
    candidates.retain(|c| !applied.contains(&c.id));
    candidates
}

/// Applies pending migrations in order, one transaction per file.
///
/// The run stops at the first failure. Files applied before it stay
/// applied and recorded; the failing file and everything after it are
/// left pending.
pub struct Migrator<'a> {
    db: &'a Database,
    store: &'a MigrationStore,
    tracker: &'a dyn AppliedStore,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a Database, store: &'a MigrationStore, tracker: &'a dyn AppliedStore) -> Self {
        Self { db, store, tracker }
    }

    /// List and diff without applying anything.
    pub fn plan(&self) -> Result<MigrationPlan> {
        let applied = self.tracker.load_applied()?;
        let mut candidates = self.store.list()?;
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        let pending = pending_migrations(candidates.clone(), &applied);

        debug!(
            candidates = candidates.len(),
            applied = applied.len(),
            pending = pending.len(),
            "migration plan computed"
        );
        Ok(MigrationPlan {
            candidates,
            applied,
            pending,
        })
    }

    pub fn run(&self) -> Result<MigrationReport> {
        self.run_with(|_| {})
    }

    /// Apply every pending migration, calling `on_applied` after each one
    /// is committed and recorded.
    pub fn run_with<F>(&self, mut on_applied: F) -> Result<MigrationReport>
    where
        F: FnMut(&AppliedMigration),
    {
        let plan = self.plan()?;
        let mut report = MigrationReport {
            applied: Vec::with_capacity(plan.pending.len()),
            skipped: plan.candidates.len() - plan.pending.len(),
        };

        for file in &plan.pending {
            let applied = self.apply(file)?;
            info!(
                event = "migration.applied",
                migration = %applied.id,
                statements = applied.statements,
                "applied migration"
            );
            on_applied(&applied);
            report.applied.push(applied);
        }

        info!(
            event = "migrations.complete",
            applied = report.applied.len(),
            skipped = report.skipped,
            "migration run complete"
        );
        Ok(report)
    }

    fn apply(&self, file: &MigrationFile) -> Result<AppliedMigration> {
        let sql = file.read_sql()?;
        let tx = self.db.begin()?;

        let mut statements = 0;
        for (index, statement) in split_statements(&sql).enumerate() {
            debug!(migration = %file.id, statement = index + 1, "executing: {statement}");
            if let Err(e) = tx.exec(&statement) {
                if let Err(rollback) = tx.rollback() {
                    warn!(migration = %file.id, "rollback failed: {rollback}");
                }
                return Err(Error::MigrationFailed {
                    migration: file.id.clone(),
                    statement_index: index + 1,
                    message: e.to_string(),
                });
            }
            statements += 1;
        }

        if let Err(e) = self.tracker.record_in_transaction(&tx, &file.id) {
            if let Err(rollback) = tx.rollback() {
                warn!(migration = %file.id, "rollback failed: {rollback}");
            }
            return Err(e);
        }

        tx.commit().map_err(|e| Error::Commit {
            migration: file.id.clone(),
            message: e.to_string(),
        })?;
        debug!(migration = %file.id, "committed");

        self.tracker.record(&file.id)?;

        Ok(AppliedMigration {
            id: file.id.clone(),
            statements,
        })
    }
}
