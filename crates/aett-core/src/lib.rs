//! AETT Core Library
//!
//! Shared functionality for the AETT clients:
//! - Token extraction from scanned QR payloads
//! - Ticket model and verification-result reconciliation
//! - Lifecycle status derived from expiry
//! - Scan session state machine (dedup + stale-response guard)

pub mod extract;
pub mod session;
pub mod status;
pub mod ticket;
pub mod tracing_init;

pub use extract::extract_token;
pub use session::{PendingScan, ScanSession, ScanState};
pub use status::{EXPIRING_WINDOW_SECS, TicketStatus, format_remaining, status_at};
pub use ticket::{Ticket, VerificationResult};
