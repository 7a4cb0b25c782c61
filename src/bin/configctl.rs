//! Config CLI
//!
//! Inspect, migrate and export versioned config documents.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use versioned_config::kinds::{self, deployed};
use versioned_config::{ConfigStore, SchemaVersion, StoreSettings};

#[derive(Parser)]
#[command(name = "configctl")]
#[command(about = "Inspect and migrate versioned config files")]
#[command(version)]
struct Cli {
    /// Settings file to load (optional)
    #[arg(short, long)]
    settings: Option<String>,

    /// Project root (overrides settings)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Log more
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered config kinds
    Kinds,

    /// Print a config, migrated to the latest version
    Show {
        kind: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a config and report whether it had to be migrated
    Check { kind: String },

    /// Print the schema of a kind
    Schema {
        kind: String,
        /// Version to print, e.g. `v0` or `0` (default: latest)
        #[arg(long, value_parser = parse_version)]
        version: Option<SchemaVersion>,
    },

    /// Write the latest schema of every kind to a directory
    ExportSchemas {
        #[arg(default_value = ".fluence/schemas")]
        output: PathBuf,
    },

    /// Create an empty deployed-workers record if none exists
    InitDeployed,
}

fn parse_version(s: &str) -> std::result::Result<SchemaVersion, String> {
    SchemaVersion::parse(s).ok_or_else(|| format!("invalid version '{s}', expected e.g. v1"))
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings =
        StoreSettings::load_from(cli.settings.as_deref()).context("loading store settings")?;
    if let Some(project) = cli.project {
        settings.storage.project_root = project;
    }

    let registry = Arc::new(kinds::builtin_registry().context("registering config kinds")?);
    let store = ConfigStore::from_settings(Arc::clone(&registry), &settings);

    match cli.command {
        Commands::Kinds => {
            for kind in registry.kinds() {
                let path = store.path_for(kind.name())?;
                println!(
                    "{:<12} {} ({} migrations)  {}",
                    kind.name(),
                    kind.latest_version(),
                    kind.migrations().len(),
                    path.display()
                );
            }
        }

        Commands::Show { kind, json } => {
            let config = store
                .load_readonly(&kind)
                .with_context(|| format!("loading '{kind}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(config.document())?);
            } else {
                print!("{}", config.to_config_string()?);
            }
        }

        Commands::Check { kind } => {
            let config = store
                .load_readonly(&kind)
                .with_context(|| format!("loading '{kind}'"))?;
            let latest = config.meta().kind().latest_version();
            match config.meta().migrated_from() {
                Some(from) => println!("✅ {kind}: migrated {from} -> {latest}"),
                None => println!("✅ {kind}: up to date at {latest}"),
            }
        }

        Commands::Schema { kind, version } => {
            let kind = registry.get(&kind)?;
            let schema = match version {
                Some(v) => kind.schema(u64::from(v.get()))?,
                None => kind.latest_schema(),
            };
            println!("{}", serde_json::to_string_pretty(schema.content())?);
        }

        Commands::ExportSchemas { output } => {
            let manifest = registry.export_schemas(&output)?;
            println!(
                "✅ Exported {} schema(s) to {}",
                manifest.kinds.len(),
                output.display()
            );
        }

        Commands::InitDeployed => {
            let config = deployed::init_new_readonly(&store, Vec::new())?;
            if config.meta().was_created() {
                println!("✅ Created {}", config.path().display());
            } else {
                println!("{} already exists", config.path().display());
            }
        }
    }

    Ok(())
}
