use std::path::Path;

use reak_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

/// Default project file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".reakgo";

/// Loads and writes the project configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(path, &contents)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Serialize `config` as TOML and write it to `path`.
    pub fn save(path: &Path, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, toml)?;
        info!("config written to {}", path.display());
        Ok(())
    }

    fn parse(path: &Path, contents: &str) -> Result<AppConfig> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yml" | "yaml" => serde_yaml::from_str(contents)
                .map_err(|e| Error::Config(format!("YAML parse error in {}: {e}", path.display()))),
            "toml" | "" => toml::from_str(contents)
                .map_err(|e| Error::Config(format!("TOML parse error in {}: {e}", path.display()))),
            other => Err(Error::Config(format!(
                "unsupported config extension: {other}"
            ))),
        }
    }

    fn validate(config: &AppConfig) -> Result<()> {
        if config.migrations.suffix.is_empty() {
            return Err(Error::Config("migrations.suffix cannot be empty".into()));
        }
        if !is_identifier(&config.migrations.table) {
            return Err(Error::Config(format!(
                "migrations.table is not a valid table name: {:?}",
                config.migrations.table
            )));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
