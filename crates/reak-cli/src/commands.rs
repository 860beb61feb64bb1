use std::path::Path;

use anyhow::{Context, Result};
use reak_config::{AppConfig, ConfigLoader, TrackerKind};
use reak_db::{
    AppliedStore, ConnectOptions, Database, MarkerDir, MetadataTable, MigrationStore, Migrator,
};
use serde_json::json;
use tracing::info;

use crate::prompt::{Credentials, prompt_credentials};

/// The CLI always targets a named database, never the scratch connection.
fn connect_options(config: &AppConfig, creds: Credentials) -> reak_common::Result<ConnectOptions> {
    if creds.database.is_none() {
        return Err(reak_common::Error::Connection(
            "a database name is required".into(),
        ));
    }
    Ok(ConnectOptions {
        user: creds.user,
        password: creds.password,
        database: creds.database,
        data_dir: config.database.data_dir.clone(),
    })
}

fn tracker<'db>(config: &AppConfig, db: &'db Database) -> Box<dyn AppliedStore + 'db> {
    match config.migrations.tracker {
        TrackerKind::Markers => Box::new(MarkerDir::new(&config.migrations.applied_dir)),
        TrackerKind::Table => Box::new(MetadataTable::new(db, &config.migrations.table)),
    }
}

fn store(config: &AppConfig) -> MigrationStore {
    MigrationStore::new(&config.migrations.dir, &config.migrations.suffix)
}

/// `reak migration`: apply every pending migration.
pub fn migration(config: &AppConfig) -> Result<()> {
    let creds = prompt_credentials(&config.database, "Please enter the database name")?;
    let db = Database::connect(&connect_options(config, creds)?)?;
    apply_pending(config, &db)
}

fn apply_pending(config: &AppConfig, db: &Database) -> Result<()> {
    let store = store(config);
    let tracker = tracker(config, db);
    info!(
        "applying migrations from {} (applied state in {})",
        store.dir().display(),
        tracker.location()
    );

    let report = Migrator::new(db, &store, tracker.as_ref())
        .run_with(|m| println!("Executed migration: {}", m.id))?;

    if report.applied.is_empty() {
        println!("Database is up to date");
    } else {
        println!("Applied {} migration(s)", report.applied.len());
    }
    Ok(())
}

/// `reak status`: show applied, pending and orphaned migrations.
pub fn status(config: &AppConfig, as_json: bool) -> Result<()> {
    let creds = prompt_credentials(&config.database, "Please enter the database name")?;
    let db = Database::connect(&connect_options(config, creds)?)?;
    let store = store(config);
    let tracker = tracker(config, &db);
    let plan = Migrator::new(&db, &store, tracker.as_ref()).plan()?;

    let applied: Vec<&str> = plan
        .candidates
        .iter()
        .filter(|c| plan.applied.contains(&c.id))
        .map(|c| c.id.as_str())
        .collect();
    let pending: Vec<&str> = plan.pending.iter().map(|p| p.id.as_str()).collect();
    let orphaned = plan.orphaned();

    if as_json {
        let out = json!({
            "applied": applied,
            "pending": pending,
            "orphaned": orphaned,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Database: {}", db.label());
    println!("Applied state: {}", tracker.location());
    println!();
    for id in &applied {
        println!("  [x] {id}");
    }
    for id in &pending {
        println!("  [ ] {id}");
    }
    for id in &orphaned {
        println!("  [?] {id} (applied, file missing)");
    }
    println!();
    println!("{} applied, {} pending", applied.len(), pending.len());
    Ok(())
}

/// `reak init`: write the project file, create the database and migrate it.
/// An existing project file is left untouched.
pub fn init(config_path: &Path, mut config: AppConfig) -> Result<()> {
    let existing_config = config_path.exists();

    let creds = prompt_credentials(
        &config.database,
        "Please enter the database name you want to create",
    )?;
    let opts = connect_options(&config, creds)?;
    let db = Database::create(&opts)?;

    if !existing_config {
        config.database.user = Some(opts.user.clone());
        config.database.name = opts.database.clone();
        ConfigLoader::save(config_path, &config)?;
    }

    std::fs::create_dir_all(&config.migrations.dir).with_context(|| {
        format!(
            "failed to create migrations directory {}",
            config.migrations.dir.display()
        )
    })?;

    apply_pending(&config, &db)?;
    println!("ready for use.");
    Ok(())
}
