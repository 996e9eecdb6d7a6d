//! Rider subcommand implementations.

use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use aett_client::BackendClient;
use aett_core::{ScanSession, ScanState, Ticket};
use aett_proto::{BuyRequest, TicketType, Zone};
use aett_wallet::WalletStore;

use crate::config::RiderConfig;
use crate::output;

/// Flags for `aett-rider buy`.
#[derive(clap::Args, Debug)]
pub struct BuyArgs {
    /// Fare class: single, 2h, day, monthly
    #[arg(long, default_value = "2h")]
    pub ticket_type: TicketType,

    /// Fare zone: A, B, AB, ALL
    #[arg(long, default_value = "AB")]
    pub zone: Zone,

    /// From address
    #[arg(long)]
    pub origin: Option<String>,

    /// To address
    #[arg(long)]
    pub destination: Option<String>,

    /// Optional personalization; omitting it keeps the ticket fully anonymous
    #[arg(long)]
    pub personalized_id: Option<String>,

    /// Stamp this device's card id into the purchase
    #[arg(long)]
    pub link_card: bool,
}

/// Card id actions.
#[derive(clap::Subcommand, Debug)]
pub enum CardCommand {
    /// Show the card id
    Show,
    /// Mint a card id if none exists yet
    New,
    /// Delete the card id (already-issued tickets keep their link)
    Delete,
}

/// Buy a ticket and add it to the wallet.
pub async fn buy(
    client: &BackendClient,
    wallet: &mut WalletStore,
    args: BuyArgs,
) -> anyhow::Result<()> {
    let card_id = args.link_card.then(|| wallet.ensure_card_id());
    let request = BuyRequest {
        ticket_type: args.ticket_type,
        zone: args.zone,
        origin: args.origin,
        destination: args.destination,
        personalized_id: args.personalized_id,
        card_id,
    };
    let resp = client.buy(&request).await?;
    let ticket = Ticket::from_purchase(resp, Utc::now());
    info!(ticket_type = %ticket.ticket_type, zone = %ticket.zone, "ticket purchased");

    println!("Ticket created");
    println!("  token: {}", ticket.token);
    println!(
        "  type: {}  zone: {}  expires: {}",
        ticket.ticket_type,
        ticket.zone,
        ticket.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    wallet.add(ticket);
    Ok(())
}

/// List wallet tickets; with `watch`, re-render every second against the
/// live clock. The tick only re-reads local state, it never hits the
/// backend.
pub async fn list(wallet: &WalletStore, watch: bool) -> anyhow::Result<()> {
    if !watch {
        println!("{}", output::format_wallet(wallet.tickets(), Utc::now()));
        return Ok(());
    }
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        println!("{}", output::format_wallet(wallet.tickets(), Utc::now()));
        println!("----");
    }
}

/// Verify a single scanned payload, reconciling the wallet on success.
pub async fn verify(
    client: &BackendClient,
    wallet: &mut WalletStore,
    payload: &str,
) -> anyhow::Result<()> {
    let mut session = ScanSession::new();
    let Some(pending) = session.handle_scan(payload) else {
        anyhow::bail!("empty scan payload");
    };
    let outcome = client
        .verify(&pending.token)
        .await
        .map_err(|e| e.to_string());
    session.resolve(pending.attempt, outcome);
    println!("{}", output::format_scan(session.state()));
    reconcile_if_valid(wallet, session.state());
    Ok(())
}

/// Read scan payloads from stdin (one per line), verifying each through a
/// scan session so repeats of a just-confirmed token are suppressed.
pub async fn scan(client: &BackendClient, wallet: &mut WalletStore) -> anyhow::Result<()> {
    let mut session = ScanSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", output::format_scan(session.state()));

    while let Some(line) = lines.next_line().await? {
        let Some(pending) = session.handle_scan(&line) else {
            continue;
        };
        println!("{}", output::format_scan(session.state()));
        let outcome = client
            .verify(&pending.token)
            .await
            .map_err(|e| e.to_string());
        session.resolve(pending.attempt, outcome);
        println!("{}", output::format_scan(session.state()));
        reconcile_if_valid(wallet, session.state());
    }
    Ok(())
}

/// Fold a valid verification back into the wallet (no-op for tickets that
/// are not in it).
fn reconcile_if_valid(wallet: &mut WalletStore, state: &ScanState) {
    if let ScanState::Valid { token, result, .. } = state {
        if wallet.reconcile(token, result) {
            println!("  (wallet updated)");
        }
    }
}

/// Remove one ticket from this device. The token stays valid on the
/// backend.
pub fn remove(wallet: &mut WalletStore, token: &str) {
    if wallet.remove(token) {
        println!("Removed {token} from this device.");
    } else {
        println!("No ticket with that token on this device.");
    }
}

/// Delete every ticket, gated behind an explicit confirmation.
pub fn clear(wallet: &mut WalletStore, yes: bool) -> anyhow::Result<()> {
    let count = wallet.tickets().len();
    if count == 0 {
        println!("Wallet is already empty.");
        return Ok(());
    }
    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete all {count} ticket(s) from this device?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }
    wallet.clear();
    println!("Deleted {count} ticket(s) from this device.");
    Ok(())
}

/// Manage the pseudonymous card id.
pub fn card(wallet: &mut WalletStore, command: CardCommand) {
    match command {
        CardCommand::Show => match wallet.card_id() {
            Some(id) => println!("{id}"),
            None => println!("No card id on this device."),
        },
        CardCommand::New => {
            let id = wallet.ensure_card_id();
            println!("{id}");
        }
        CardCommand::Delete => {
            if wallet.delete_card_id() {
                println!("Card id deleted. Already-issued tickets keep their link.");
            } else {
                println!("No card id on this device.");
            }
        }
    }
}

/// Show or update the persisted client configuration.
pub fn config(backend_url: Option<String>, api_key: Option<String>) -> anyhow::Result<()> {
    let mut config = RiderConfig::load();
    if backend_url.is_none() && api_key.is_none() {
        println!(
            "backend_url: {}",
            config.backend_url.as_deref().unwrap_or("(default)")
        );
        println!(
            "api_key: {}",
            if config.api_key.is_some() {
                "(set)"
            } else {
                "(unset)"
            }
        );
        return Ok(());
    }
    if let Some(url) = backend_url {
        config.backend_url = Some(url);
    }
    if let Some(key) = api_key {
        config.api_key = Some(key);
    }
    config.save()?;
    println!("Configuration saved.");
    Ok(())
}
