//! AETT conductor scanner.
//!
//! Reads scanned QR payloads from stdin (one per line, fed by the external
//! QR decoder) and verifies each against the ticket backend, reporting
//! VALID / INVALID / ERROR per scan. Repeated scans of a token that was
//! just confirmed valid are suppressed locally; the backend stays the
//! authority on reuse either way.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use aett_client::{BackendClient, BackendConfig};
use aett_core::tracing_init::init_tracing;
use aett_core::{ScanSession, ScanState, VerificationResult};

mod render;

#[derive(Parser, Debug)]
#[command(name = "aett-conductor")]
#[command(version, about = "Scan and verify AETT tickets", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, env = "AETT_BACKEND_URL", default_value = "http://localhost:8000")]
    backend_url: String,

    /// Verify a single payload and exit instead of reading scans from stdin
    #[arg(long)]
    payload: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("aett_conductor=info");
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = %cli.backend_url,
        "Starting conductor scanner"
    );

    let config = BackendConfig {
        base_url: cli.backend_url,
        api_key: None,
        timeout_secs: cli.timeout,
    };
    let client = BackendClient::new(&config)?;

    match cli.payload {
        Some(payload) => verify_once(&client, &payload).await,
        None => scan_loop(client).await,
    }
}

/// Verify one payload and exit.
async fn verify_once(client: &BackendClient, payload: &str) -> anyhow::Result<()> {
    let mut session = ScanSession::new();
    let Some(pending) = session.handle_scan(payload) else {
        anyhow::bail!("empty scan payload");
    };
    println!("{}", render::format_state(session.state()));

    let outcome = client
        .verify(&pending.token)
        .await
        .map_err(|e| e.to_string());
    session.resolve(pending.attempt, outcome);
    println!("{}", render::format_state(session.state()));
    Ok(())
}

/// Event loop: scan lines arrive on stdin, verification outcomes on a
/// channel.
///
/// Verifications run as spawned tasks so a slow response never blocks the
/// next scan; the session's attempt guard drops any response that arrives
/// for a superseded scan.
async fn scan_loop(client: BackendClient) -> anyhow::Result<()> {
    let mut session = ScanSession::new();
    let (tx, mut rx) = mpsc::channel::<(u64, Result<VerificationResult, String>)>(16);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", render::format_state(session.state()));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(pending) = session.handle_scan(&line) {
                    println!("{}", render::format_state(session.state()));
                    let client = client.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let outcome = client
                            .verify(&pending.token)
                            .await
                            .map_err(|e| e.to_string());
                        let _ = tx.send((pending.attempt, outcome)).await;
                    });
                }
            }
            Some((attempt, outcome)) = rx.recv() => {
                if session.resolve(attempt, outcome) {
                    println!("{}", render::format_state(session.state()));
                }
            }
        }
    }

    // Stdin closed; wait out any verification still in flight so the last
    // scan gets its terminal status.
    while matches!(session.state(), ScanState::Verifying { .. }) {
        let Some((attempt, outcome)) = rx.recv().await else {
            break;
        };
        if session.resolve(attempt, outcome) {
            println!("{}", render::format_state(session.state()));
        }
    }

    Ok(())
}
