//! AETT rider wallet.
//!
//! Buys anonymous tickets, keeps them in a local wallet on this device,
//! and verifies scanned tickets against the backend. No account, no login:
//! the token in the wallet is the whole credential.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use aett_client::{BackendClient, BackendConfig};
use aett_core::tracing_init::init_tracing;
use aett_wallet::{WalletStore, default_wallet_path};

mod commands;
mod config;
mod output;

use commands::{BuyArgs, CardCommand};
use config::RiderConfig;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "aett-rider")]
#[command(version, about = "Anonymous transit ticket wallet", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "AETT_BACKEND_URL")]
    backend_url: Option<String>,

    /// API key for ticket purchase (overrides the config file)
    #[arg(long, env = "AETT_API_KEY")]
    api_key: Option<String>,

    /// Wallet file (defaults to ~/.aett/wallet.json)
    #[arg(long)]
    wallet: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Buy a new ticket
    Buy(BuyArgs),

    /// List the tickets in the wallet
    List {
        /// Re-render with a live countdown every second
        #[arg(long)]
        watch: bool,
    },

    /// Verify one scanned payload
    Verify { payload: String },

    /// Read scan payloads from stdin, verifying each
    Scan,

    /// Remove one ticket from this device
    Remove { token: String },

    /// Delete every ticket from this device
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Manage the pseudonymous card id
    #[command(subcommand)]
    Card(CardCommand),

    /// Show or update the saved client configuration
    Config {
        /// Set the backend base URL
        #[arg(long)]
        backend_url: Option<String>,

        /// Set the purchase API key
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("aett_rider=warn");

    let stored = RiderConfig::load();
    let backend_url = cli
        .backend_url
        .or(stored.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let api_key = cli.api_key.or(stored.api_key);
    let wallet_override = cli.wallet;

    match cli.command {
        Command::Config {
            backend_url,
            api_key,
        } => commands::config(backend_url, api_key),
        Command::Buy(args) => {
            let mut wallet = open_wallet(wallet_override)?;
            let client = backend_client(backend_url, api_key)?;
            commands::buy(&client, &mut wallet, args).await
        }
        Command::List { watch } => {
            let wallet = open_wallet(wallet_override)?;
            commands::list(&wallet, watch).await
        }
        Command::Verify { payload } => {
            let mut wallet = open_wallet(wallet_override)?;
            let client = backend_client(backend_url, api_key)?;
            commands::verify(&client, &mut wallet, &payload).await
        }
        Command::Scan => {
            let mut wallet = open_wallet(wallet_override)?;
            let client = backend_client(backend_url, api_key)?;
            commands::scan(&client, &mut wallet).await
        }
        Command::Remove { token } => {
            let mut wallet = open_wallet(wallet_override)?;
            commands::remove(&mut wallet, &token);
            Ok(())
        }
        Command::Clear { yes } => {
            let mut wallet = open_wallet(wallet_override)?;
            commands::clear(&mut wallet, yes)
        }
        Command::Card(command) => {
            let mut wallet = open_wallet(wallet_override)?;
            commands::card(&mut wallet, command);
            Ok(())
        }
    }
}

/// Open the wallet at the override path, or the default location.
fn open_wallet(path_override: Option<PathBuf>) -> anyhow::Result<WalletStore> {
    let path = path_override
        .or_else(default_wallet_path)
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory; pass --wallet"))?;
    info!(path = %path.display(), "Opening wallet");
    Ok(WalletStore::open(path))
}

fn backend_client(
    backend_url: String,
    api_key: Option<String>,
) -> anyhow::Result<BackendClient> {
    let mut config = BackendConfig::new(backend_url);
    config.api_key = api_key;
    Ok(BackendClient::new(&config)?)
}
