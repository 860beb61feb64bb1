use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use reak_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::gateway::{Database, MigrationTx};

/// Persists which migrations have been applied.
pub trait AppliedStore {
    /// Ids recorded as applied by earlier runs. Creates the backing store on first use.
    fn load_applied(&self) -> Result<BTreeSet<String>>;

    /// Called inside the migration's transaction, before commit.
    fn record_in_transaction(&self, _tx: &MigrationTx<'_>, _id: &str) -> Result<()> {
        Ok(())
    }

    /// Called after the migration's transaction has committed.
    fn record(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    /// Where the applied state lives, for messages.
    fn location(&self) -> String;
}

/// One zero-byte marker file per applied migration, named after the migration.
///
/// Marking happens after commit, so a crash between the two leaves a
/// committed migration unmarked.
pub struct MarkerDir {
    dir: PathBuf,
}

impl MarkerDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AppliedStore for MarkerDir {
    fn load_applied(&self) -> Result<BTreeSet<String>> {
        let not_found = |source| Error::DirectoryNotFound {
            path: self.dir.clone(),
            source,
        };

        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(not_found)?;
            info!("created marker directory {}", self.dir.display());
            return Ok(BTreeSet::new());
        }

        let mut applied = BTreeSet::new();
        for entry in std::fs::read_dir(&self.dir).map_err(not_found)? {
            let entry = entry.map_err(not_found)?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => {
                    applied.insert(name);
                }
                Err(name) => warn!("ignoring non UTF-8 marker {name:?}"),
            }
        }

        debug!(
            "{} applied marker(s) in {}",
            applied.len(),
            self.dir.display()
        );
        Ok(applied)
    }

    fn record(&self, id: &str) -> Result<()> {
        let path = self.dir.join(id);
        let persist = || -> std::io::Result<()> {
            let file = OpenOptions::new().create(true).write(true).open(&path)?;
            file.sync_all()?;
            sync_dir(&self.dir)
        };
        persist().map_err(|e| Error::RecordPersist {
            migration: id.to_string(),
            message: format!("failed to write marker {}: {e}", path.display()),
        })?;
        debug!("marked {id} as applied at {}", path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Flush the directory entry of a newly created marker.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Applied state kept in a table of the target database. The row is
/// inserted inside the migration's own transaction.
pub struct MetadataTable<'db> {
    db: &'db Database,
    table: String,
}

impl<'db> MetadataTable<'db> {
    /// `table` must be a plain SQL identifier; it is interpolated into DDL.
    pub fn new(db: &'db Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }
}

impl AppliedStore for MetadataTable<'_> {
    fn load_applied(&self) -> Result<BTreeSet<String>> {
        self.db.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
            self.table
        ))?;

        let names = self
            .db
            .query_strings(&format!("SELECT name FROM {}", self.table))?;
        Ok(names.into_iter().collect())
    }

    fn record_in_transaction(&self, tx: &MigrationTx<'_>, id: &str) -> Result<()> {
        tx.exec_params(
            &format!("INSERT INTO {} (name) VALUES (?1)", self.table),
            [id],
        )
        .map_err(|e| Error::Database(format!("failed to record {id} in {}: {e}", self.table)))?;
        Ok(())
    }

    fn location(&self) -> String {
        format!("table {} in {}", self.table, self.db.label())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_marker_dir_is_created_on_load() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("applied_migrations");
        let tracker = MarkerDir::new(&dir);

        assert!(tracker.load_applied().unwrap().is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn recorded_markers_are_empty_files() {
        let root = TempDir::new().unwrap();
        let tracker = MarkerDir::new(root.path());
        tracker.record("001_init.sql").unwrap();

        let marker = root.path().join("001_init.sql");
        assert_eq!(std::fs::metadata(&marker).unwrap().len(), 0);
    }

    #[test]
    fn markers_survive_a_fresh_tracker() {
        let root = TempDir::new().unwrap();
        MarkerDir::new(root.path()).record("005_x.sql").unwrap();

        let applied = MarkerDir::new(root.path()).load_applied().unwrap();
        assert!(applied.contains("005_x.sql"));
    }

    #[test]
    fn subdirectories_are_not_markers() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("002.sql")).unwrap();
        std::fs::write(root.path().join("001.sql"), "").unwrap();

        let applied = MarkerDir::new(root.path()).load_applied().unwrap();
        assert_eq!(applied.into_iter().collect::<Vec<_>>(), vec!["001.sql"]);
    }

    #[test]
    fn marker_path_that_is_a_file_is_directory_not_found() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("applied_migrations");
        std::fs::write(&path, "oops").unwrap();

        let err = MarkerDir::new(&path).load_applied().unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));
    }

    #[test]
    fn record_failure_is_record_persist_error() {
        let root = TempDir::new().unwrap();
        let tracker = MarkerDir::new(root.path().join("gone"));

        let err = tracker.record("001.sql").unwrap_err();
        assert!(matches!(err, Error::RecordPersist { ref migration, .. } if migration == "001.sql"));
    }

    #[test]
    fn table_tracker_creates_table_and_records_in_transaction() {
        let db = Database::in_memory().unwrap();
        let tracker = MetadataTable::new(&db, "schema_migrations");
        assert!(tracker.load_applied().unwrap().is_empty());

        let tx = db.begin().unwrap();
        tracker.record_in_transaction(&tx, "001_init.sql").unwrap();
        tx.commit().unwrap();

        let applied = tracker.load_applied().unwrap();
        assert!(applied.contains("001_init.sql"));
    }

    #[test]
    fn table_record_is_discarded_on_rollback() {
        let db = Database::in_memory().unwrap();
        let tracker = MetadataTable::new(&db, "schema_migrations");
        tracker.load_applied().unwrap();

        let tx = db.begin().unwrap();
        tracker.record_in_transaction(&tx, "001_init.sql").unwrap();
        tx.rollback().unwrap();

        assert!(tracker.load_applied().unwrap().is_empty());
    }
}
