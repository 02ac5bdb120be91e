//! Fairbet service entrypoint.

use clap::Parser;
use fairbet::api::ApiServer;
use fairbet::config::FairbetConfig;
use fairbet::ledger::settlement::SettlementEngine;
use fairbet::ledger::store::LedgerStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fairbet", about = "Provably-fair bet settlement service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long, default_value = "fairbet.toml")]
    config: String,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the ledger data directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairbet=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        info!("Loading config from {}", args.config);
        FairbetConfig::load(&args.config)?
    } else {
        info!("Config file {} not found, using defaults", args.config);
        FairbetConfig::default()
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_directory = data_dir;
    }
    config.validate()?;

    info!("Opening ledger at {}", config.storage.data_directory);
    let store = Arc::new(LedgerStore::open(&config.storage.data_directory)?);
    let engine = Arc::new(SettlementEngine::new(store.clone(), config.game.clone()));

    ApiServer::new(config.server, store, engine).run().await
}
