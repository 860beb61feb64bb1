use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level project configuration, stored in `.reakgo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub migrations: MigrationsConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Directory holding the `.sql` migration files.
    pub dir: PathBuf,
    pub suffix: String,
    pub tracker: TrackerKind,
    /// Marker directory used when `tracker = "markers"`.
    pub applied_dir: PathBuf,
    /// Metadata table used when `tracker = "table"`.
    pub table: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("migrations"),
            suffix: ".sql".to_string(),
            tracker: TrackerKind::default(),
            applied_dir: PathBuf::from("applied_migrations"),
            table: "schema_migrations".to_string(),
        }
    }
}

/// Where applied-migration state is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    /// One zero-byte marker file per applied migration.
    #[default]
    Markers,
    /// A metadata table written in the same transaction as the migration.
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub data_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            name: None,
            user: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
