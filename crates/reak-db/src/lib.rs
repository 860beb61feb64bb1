pub mod gateway;
pub mod migrations;

pub use gateway::{ConnectOptions, Database, MigrationTx};
pub use migrations::{
    AppliedMigration, AppliedStore, MarkerDir, MetadataTable, MigrationFile, MigrationPlan,
    MigrationReport, MigrationStore, Migrator,
};
