//! Local wallet store for the AETT rider client.
//!
//! Persists the rider's tickets and optional pseudonymous card id to a
//! versioned JSON file on this device. The wallet is deliberately
//! unsynchronized: losing the file is losing the wallet. Storage failures
//! degrade the store to in-memory-only for the run instead of crashing
//! the session.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use aett_core::{Ticket, VerificationResult};

/// Current on-disk schema version.
///
/// Files written before the tag existed decode as version 0 and are
/// upgraded on the next save. Files tagged newer than this refuse to load
/// so an older client never clobbers a newer format.
pub const WALLET_SCHEMA_VERSION: u32 = 1;

/// Wallet storage errors.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode wallet file: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Wallet file uses schema version {found}, newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// On-disk wallet payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletData {
    /// Schema version tag.
    #[serde(default)]
    pub version: u32,
    /// Tickets, newest first.
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    /// Pseudonymous device-level card id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

impl WalletData {
    /// Decode and version-check a wallet file. Returns default if the file
    /// doesn't exist.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        if !path.exists() {
            return Ok(Self {
                version: WALLET_SCHEMA_VERSION,
                ..Self::default()
            });
        }
        let data = std::fs::read_to_string(path)?;
        let mut wallet: Self = serde_json::from_str(&data)?;
        if wallet.version > WALLET_SCHEMA_VERSION {
            return Err(WalletError::UnsupportedVersion {
                found: wallet.version,
                supported: WALLET_SCHEMA_VERSION,
            });
        }
        wallet.version = WALLET_SCHEMA_VERSION;
        Ok(wallet)
    }

    /// Write the wallet file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Default wallet location: `~/.aett/wallet.json`.
pub fn default_wallet_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".aett").join("wallet.json"))
}

/// The rider's wallet, durable across sessions on one device.
///
/// Every mutation is written through to disk. When a write fails the store
/// logs it and keeps operating in memory for the rest of the run.
#[derive(Debug)]
pub struct WalletStore {
    data: WalletData,
    /// Write-through target; `None` once storage has failed (memory-only).
    path: Option<PathBuf>,
}

impl WalletStore {
    /// Open the wallet at `path`.
    ///
    /// Never fails: an unreadable, corrupt, or newer-schema file is left
    /// untouched on disk and the store starts in-memory for this run.
    pub fn open(path: PathBuf) -> Self {
        match WalletData::load(&path) {
            Ok(data) => Self {
                data,
                path: Some(path),
            },
            Err(err) => {
                warn!(path = %path.display(), %err, "wallet unreadable, continuing in memory");
                Self::in_memory()
            }
        }
    }

    /// A wallet with no backing file.
    pub fn in_memory() -> Self {
        Self {
            data: WalletData {
                version: WALLET_SCHEMA_VERSION,
                ..WalletData::default()
            },
            path: None,
        }
    }

    /// Tickets, newest first.
    pub fn tickets(&self) -> &[Ticket] {
        &self.data.tickets
    }

    /// Look up a ticket by token.
    pub fn find(&self, token: &str) -> Option<&Ticket> {
        self.data.tickets.iter().find(|t| t.token == token)
    }

    pub fn card_id(&self) -> Option<&str> {
        self.data.card_id.as_deref()
    }

    /// Whether mutations are still being written to disk.
    pub const fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    /// Add a freshly purchased ticket at the front (newest first).
    pub fn add(&mut self, ticket: Ticket) {
        self.data.tickets.insert(0, ticket);
        self.persist();
    }

    /// Remove a ticket by token. Removing an absent token is a no-op.
    ///
    /// Removal is local-only and does not invalidate the token on the
    /// backend.
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.data.tickets.len();
        self.data.tickets.retain(|t| t.token != token);
        let removed = self.data.tickets.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Fold a verification result into the matching ticket, if any.
    ///
    /// Coalesce/OR only — a later verification can never clear
    /// `already_checked` or move an existing `first_checked_at`. Verifying
    /// a token with no local ticket is a no-op, not an insert.
    pub fn reconcile(&mut self, token: &str, result: &VerificationResult) -> bool {
        let Some(ticket) = self.data.tickets.iter_mut().find(|t| t.token == token) else {
            return false;
        };
        ticket.reconcile(result);
        self.persist();
        true
    }

    /// Drop every ticket. Destructive and local-only; callers gate this
    /// behind an explicit confirmation. The backend is not informed.
    pub fn clear(&mut self) {
        self.data.tickets.clear();
        self.persist();
    }

    /// Return the card id, minting a random one on first use.
    pub fn ensure_card_id(&mut self) -> String {
        if let Some(id) = &self.data.card_id {
            return id.clone();
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.data.card_id = Some(id.clone());
        self.persist();
        id
    }

    /// Delete the card id. Tickets already issued against it keep their
    /// `card_id` field.
    pub fn delete_card_id(&mut self) -> bool {
        let had = self.data.card_id.take().is_some();
        if had {
            self.persist();
        }
        had
    }

    fn persist(&mut self) {
        let Some(path) = &self.path else { return };
        if let Err(err) = self.data.save(path) {
            warn!(path = %path.display(), %err, "wallet write failed, continuing in memory");
            self.path = None;
        }
    }
}
