//! Ticket model and verification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aett_proto::{BuyResponse, TicketType, Zone};

use crate::status::{TicketStatus, status_at};

/// One issued, anonymous right-to-travel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Opaque credential; the unique key for all lookups. Never parsed for
    /// trust decisions.
    pub token: String,
    pub ticket_type: TicketType,
    pub zone: Zone,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    /// Absent means the ticket is fully anonymous.
    #[serde(default)]
    pub personalized_id: Option<String>,
    /// Pseudonymous device-level link, fixed at issuance.
    #[serde(default)]
    pub card_id: Option<String>,
    /// Set exactly once by the issuing backend; never extended client-side.
    pub expires_at: DateTime<Utc>,
    /// First successful verification as reported by the backend. Stable
    /// once set.
    #[serde(default)]
    pub first_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub already_checked: bool,
    /// Local issuance-observed timestamp (client bookkeeping only).
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a wallet ticket from a successful purchase.
    pub fn from_purchase(resp: BuyResponse, created_at: DateTime<Utc>) -> Self {
        Self {
            token: resp.token,
            ticket_type: resp.ticket_type,
            zone: resp.zone,
            origin: resp.origin,
            destination: resp.destination,
            personalized_id: resp.personalized_id,
            card_id: resp.card_id,
            expires_at: resp.expires_at,
            first_checked_at: resp.first_checked_at,
            already_checked: resp.already_checked,
            created_at,
        }
    }

    /// Fold a verification result into this ticket.
    ///
    /// `first_checked_at` keeps the earliest known value and
    /// `already_checked` only ever moves to `true` — a later verification
    /// can never rewind either field.
    pub fn reconcile(&mut self, result: &VerificationResult) {
        if self.first_checked_at.is_none() {
            self.first_checked_at = result.first_checked_at;
        }
        self.already_checked = self.already_checked || result.already_checked;
    }

    /// Derived lifecycle status as of `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> TicketStatus {
        status_at(self.expires_at, now)
    }
}

/// Outcome of one well-formed verification call.
///
/// Ephemeral: it either seeds the conductor display or reconciles a stored
/// ticket, and is never persisted on its own. The backend is the sole
/// authority on every field here.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub valid: bool,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub ticket_type: Option<TicketType>,
    pub zone: Option<Zone>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub personalized_id: Option<String>,
    /// Audit-chain hash echoed by the backend, shown for cross-checking.
    pub chain: Option<String>,
    pub first_checked_at: Option<DateTime<Utc>>,
    pub already_checked: bool,
}
