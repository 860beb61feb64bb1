//! File-based SQL migrations.
//!
//! Migration files live in a flat directory and are applied in plain
//! lexical order of their file names, one transaction per file. Which files
//! have been applied is tracked by an [`AppliedStore`].

mod executor;
mod splitter;
mod store;
mod tracker;

pub use executor::{
    AppliedMigration, MigrationPlan, MigrationReport, Migrator, pending_migrations,
};
pub use splitter::split_statements;
pub use store::{MigrationFile, MigrationStore};
pub use tracker::{AppliedStore, MarkerDir, MetadataTable};
