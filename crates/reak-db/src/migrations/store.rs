use std::path::{Path, PathBuf};

use reak_common::{Error, Result};
use tracing::{debug, warn};

/// A migration file discovered on disk. The id is the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub id: String,
    pub path: PathBuf,
}

impl MigrationFile {
    pub fn read_sql(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Lists candidate migration files in a flat directory.
pub struct MigrationStore {
    dir: PathBuf,
    suffix: String,
}

impl MigrationStore {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Non-recursive listing of files whose name ends with the suffix.
    /// The result is in directory order, not sorted.
    pub fn list(&self) -> Result<Vec<MigrationFile>> {
        let not_found = |source| Error::DirectoryNotFound {
            path: self.dir.clone(),
            source,
        };
        let entries = std::fs::read_dir(&self.dir).map_err(not_found)?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(not_found)?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                warn!(
                    "skipping migration with non UTF-8 name: {}",
                    entry.path().display()
                );
                continue;
            };
            if name.ends_with(&self.suffix) {
                files.push(MigrationFile {
                    id: name,
                    path: entry.path(),
                });
            }
        }

        debug!(
            "found {} migration file(s) in {}",
            files.len(),
            self.dir.display()
        );
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn ids(files: &[MigrationFile]) -> Vec<&str> {
        let mut ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn lists_only_matching_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("001_init.sql"), "CREATE TABLE a (x);").unwrap();
        std::fs::write(dir.path().join("002_seed.sql"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "notes").unwrap();
        std::fs::write(dir.path().join("003.sql.bak"), "old").unwrap();

        let files = MigrationStore::new(dir.path(), ".sql").list().unwrap();
        assert_eq!(ids(&files), vec!["001_init.sql", "002_seed.sql"]);
    }

    #[test]
    fn does_not_descend_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested.sql")).unwrap();
        std::fs::write(dir.path().join("nested.sql").join("004.sql"), "").unwrap();
        std::fs::write(dir.path().join("001.sql"), "").unwrap();

        let files = MigrationStore::new(dir.path(), ".sql").list().unwrap();
        assert_eq!(ids(&files), vec!["001.sql"]);
    }

    #[test]
    fn empty_directory_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let files = MigrationStore::new(dir.path(), ".sql").list().unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_directory_is_directory_not_found() {
        let dir = TempDir::new().unwrap();
        let err = MigrationStore::new(dir.path().join("missing"), ".sql")
            .list()
            .unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound { .. }));
    }

    #[test]
    fn custom_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("001.up.sql"), "").unwrap();
        std::fs::write(dir.path().join("001.down.sql"), "").unwrap();

        let files = MigrationStore::new(dir.path(), ".up.sql").list().unwrap();
        assert_eq!(ids(&files), vec!["001.up.sql"]);
    }
}
