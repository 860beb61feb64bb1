mod commands;
mod generate;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reak_config::{AppConfig, ConfigLoader, DEFAULT_CONFIG_FILE};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reak", version, about = "Project scaffolding and SQL migrations")]
struct Cli {
    /// Path to the project config file
    #[arg(long, global = true, env = "REAK_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the project file, create the database and apply migrations
    Init,
    /// Apply pending migrations from the migrations directory
    Migration,
    /// Show applied and pending migrations
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate boilerplate source files
    Generate {
        #[arg(value_enum)]
        target: generate::Target,
        name: String,
    },
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::load(&cli.config)?;
    init_logging(&config, cli.verbose);
    if cli.config.exists() {
        debug!("config loaded from {}", cli.config.display());
    } else {
        debug!("no config at {}, using defaults", cli.config.display());
    }

    match cli.command {
        Command::Init => commands::init(&cli.config, config),
        Command::Migration => commands::migration(&config),
        Command::Status { json } => commands::status(&config, json),
        Command::Generate { target, name } => {
            for path in generate::generate(std::path::Path::new("."), target, &name)? {
                println!("Created {}", path.display());
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<reak_common::Error>())
                .map(reak_common::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
