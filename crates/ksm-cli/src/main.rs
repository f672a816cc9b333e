use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ksm_notation::{LocalVault, NotationReference};
use ksm_secrets::{KsmConfig, KsmSecretService, VaultSecretService};
use tracing_subscriber::EnvFilter;

/// ksm - Resolve Keeper secret notations
#[derive(Parser, Debug)]
#[command(name = "ksm")]
#[command(about = "Parse and resolve Keeper secret notations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to ~/.config/ksm/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a notation and print its components as JSON
    Parse {
        /// Notation, e.g. keeper://<uid>/field/password
        notation: String,
    },

    /// Resolve a notation to its secret value
    Get {
        /// Notation, e.g. keeper://<uid>/field/password
        notation: String,

        /// Local JSON records file to resolve against
        #[arg(short, long)]
        records: Option<PathBuf>,
    },

    /// Encode a file as base64 for use in a records file
    Encode {
        /// Path to the file to encode (certificate, key, etc.)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays clean for values)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter()?)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse { notation } => run_parse(notation),
        Commands::Get { notation, records } => {
            run_get(cli.config.clone(), notation, records.clone()).await
        }
        Commands::Encode { file } => run_encode(file),
    }
}

/// Default log filter: info for the workspace crates, overridable via RUST_LOG
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("ksm_cli=info".parse()?)
        .add_directive("ksm_notation=info".parse()?)
        .add_directive("ksm_secrets=info".parse()?))
}

fn run_parse(notation: &str) -> Result<()> {
    let reference: NotationReference = notation
        .parse()
        .with_context(|| format!("Invalid notation: {}", notation))?;

    println!("{}", serde_json::to_string_pretty(&reference)?);
    Ok(())
}

async fn run_get(
    config_path: Option<PathBuf>,
    notation: &str,
    records: Option<PathBuf>,
) -> Result<()> {
    // Configuration problems are reported before the notation is looked at
    let config = match config_path {
        Some(path) => KsmConfig::load(&path),
        None => KsmConfig::load_default(),
    }
    .context("Failed to load config")?
    .resolve()
    .context("Incomplete configuration")?;
    tracing::debug!(hostname = %config.options.hostname, "Configuration resolved");

    let records_file = records.or_else(|| config.records_file.clone()).context(
        "Records file required. Use --records, KEEPER_RECORDS_FILE, or records_file in config",
    )?;

    let vault = LocalVault::open(&records_file)
        .with_context(|| format!("Failed to open records file {}", records_file.display()))?;
    tracing::info!("Using local records from {}", vault.path().display());

    let service = KsmSecretService::from_config(Arc::new(vault), config);
    tracing::info!(
        ttl_ms = service.cache().ttl().as_millis() as u64,
        "Resolving {}",
        notation
    );

    let value = service
        .get_value(notation)
        .await
        .context("Failed to resolve secret")?;

    println!("{}", value);
    Ok(())
}

fn run_encode(file_path: &Path) -> Result<()> {
    let content = std::fs::read(file_path)
        .with_context(|| format!("Failed to read file: {}", file_path.display()))?;

    println!("{}", ksm_notation::base64::encode(&content));

    Ok(())
}
