//! `esign` operator CLI.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use esign_engine::logging::init_logging;
use esign_engine::{
    Address, DocumentHash, DocumentRegistry, EthIdentity, IdentityName, RegistryConfig,
    RegistryError, SimpleIdentity, derive_document_key,
};

#[derive(Parser)]
#[command(name = "esign", version = "0.1", about = "Document provenance registry CLI")]
struct Cli {
    /// JSON config file; ESIGN_* environment variables are used when absent
    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Directory for rolling log files")]
    log_dir: Option<String>,

    #[arg(long, help = "Write file logs as JSON")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the document key an issuer receives for a creation sequence
    DeriveKey {
        #[arg(short, long, help = "Hex-encoded 20-byte issuer reference")]
        issuer: String,

        #[arg(short, long)]
        sequence: u64,
    },

    /// Decode a 32-byte identity name token to its display form
    DecodeName {
        #[arg(short, long, help = "Hex-encoded 32-byte name token")]
        name: String,
    },

    /// Issue, endorse and re-endorse a document against an in-process registry
    Demo {
        #[arg(long, default_value = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")]
        hash: String,
    },
}

fn load_config(cli: &Cli) -> Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => RegistryConfig::from_env().context("invalid ESIGN_* environment")?,
    };
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    if cli.json_logs {
        config.json_logs = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments using clap (see `Cli` and `Commands` structs)
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Keep the guard alive so file logs are flushed on exit.
    let _log_guard = init_logging(&config.log_dir, config.json_logs);

    match cli.command {
        Commands::DeriveKey { issuer, sequence } => {
            let issuer: Address = issuer.parse().context("invalid issuer reference")?;
            let key = derive_document_key(&issuer, sequence);
            println!("{key}");
        }

        Commands::DecodeName { name } => {
            let token: IdentityName = name.parse().context("invalid name token")?;
            println!("{}", token.to_display_string());
        }

        Commands::Demo { hash } => {
            let hash: DocumentHash = hash.parse().context("invalid document hash")?;
            run_demo(&config, hash).await?;
        }
    }

    Ok(())
}

async fn run_demo(config: &RegistryConfig, hash: DocumentHash) -> Result<()> {
    let registry = DocumentRegistry::from_config(config);

    let x_owner = Address([0x10; 20]);
    let y_owner = Address([0x20; 20]);
    let x: Arc<dyn EthIdentity> = Arc::new(SimpleIdentity::new("issuer-x", x_owner));
    let y: Arc<dyn EthIdentity> = Arc::new(SimpleIdentity::new("signer-y", y_owner));
    let x_ref = registry.enroll(&x)?;
    let y_ref = registry.enroll(&y)?;
    info!(issuer = %x_ref, signer = %y_ref, "demo identities enrolled");

    let key = registry.new_doc(&x_owner, hash, x).await?;
    info!(key = %key, "demo document issued");

    registry.sign_doc(&y_owner, &key, Arc::clone(&y)).await?;

    let duplicate = match registry.sign_doc(&y_owner, &key, y).await {
        Err(err @ RegistryError::DuplicateSignature { .. }) => err.to_string(),
        Err(other) => return Err(other.into()),
        Ok(()) => anyhow::bail!("second endorsement by the same identity was accepted"),
    };

    let document = registry
        .get_document(&key)?
        .context("demo document vanished")?;
    let signatory = registry.get_signatory(&key, 0).await?;

    let report = json!({
        "identities": { "issuer-x": x_ref, "signer-y": y_ref },
        "document": document,
        "signatory_0": signatory,
        "duplicate_attempt": duplicate,
        "events": registry.events().all(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

// cargo run -p esign_cli -- derive-key --issuer 0x0101010101010101010101010101010101010101 --sequence 1
// cargo run -p esign_cli -- decode-name --name 0x616c696365000000000000000000000000000000000000000000000000000000
// cargo run -p esign_cli -- --log-dir /tmp/esign demo
