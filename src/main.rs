// Entry point for the buzzzy terminal client
use std::sync::Arc;

use buzzzy_client::client::app::ClientApp;
use buzzzy_client::client::cli_client::CliClient;
use buzzzy_client::client::config::ClientConfig;
use buzzzy_client::client::utils::session_store::{KeyValueStore, KeyringStore, MemoryStore};
use buzzzy_client::utils::logger::ClientLogger;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(name = "buzzzy-cli")]
#[command(about = "Terminal client for the Buzzzy social network")]
struct Args {
    /// Dotenv file read before the process environment
    #[arg(long)]
    env_file: Option<String>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
    /// Keep the session in memory only; nothing is written to the keyring
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.env_file {
        Some(path) => ClientConfig::from_env_file(path),
        None => ClientConfig::from_env(),
    };

    let level = if args.verbose { "debug" } else { config.log_level.as_str() };
    ClientLogger::init(level);
    config.log_summary();

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        info!("Ephemeral session: credentials will not be persisted");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(KeyringStore::new(config.fallback_dir()))
    };

    let app = ClientApp::from_config(config, store)?;
    CliClient::new(app).run().await
}
