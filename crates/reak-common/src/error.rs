use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("directory not found: {}: {source}", path.display())]
    DirectoryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration {migration} failed at statement #{statement_index}: {message}")]
    MigrationFailed {
        migration: String,
        /// 1-based position of the failing statement within the file.
        statement_index: usize,
        message: String,
    },

    #[error("commit of migration {migration} failed, outcome unknown: {message}")]
    Commit { migration: String, message: String },

    #[error(
        "migration {migration} was committed but could not be recorded as applied \
         ({message}); verify the database manually before running again"
    )]
    RecordPersist { migration: String, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("generate error: {0}")]
    Generate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Connection(_) => 2,
            Error::MigrationFailed { .. } | Error::Commit { .. } => 3,
            Error::RecordPersist { .. } => 4,
            Error::DirectoryNotFound { .. } => 5,
            _ => 1,
        }
    }
}
