//! Status line formatting for scan outcomes.
//!
//! One block of text per session transition. The token (and the raw
//! payload, when it differs) is always shown so a conductor can cross-check
//! manually even when verification errors out.

use chrono::{DateTime, Utc};

use aett_core::{ScanState, VerificationResult};

/// Render the current session state.
pub fn format_state(state: &ScanState) -> String {
    match state {
        ScanState::Idle => "Waiting for scan...".to_string(),
        ScanState::Verifying { token, .. } => format!("VERIFYING  token={token}"),
        ScanState::Valid { raw, token, result } => {
            let mut out = format!("VALID      token={token}{}", check_note(result));
            push_details(&mut out, result);
            push_raw(&mut out, raw, token);
            out
        }
        ScanState::Invalid { raw, token, result } => {
            let reason = result.reason.as_deref().unwrap_or("Ticket invalid");
            let mut out = format!("INVALID    token={token}  reason: {reason}");
            push_details(&mut out, result);
            push_raw(&mut out, raw, token);
            out
        }
        ScanState::Error {
            raw,
            token,
            message,
        } => {
            let mut out = format!("ERROR      token={token}  {message}");
            push_raw(&mut out, raw, token);
            out
        }
    }
}

fn check_note(result: &VerificationResult) -> String {
    if result.already_checked {
        match result.first_checked_at {
            Some(ts) => format!("  (already checked at {})", fmt_ts(ts)),
            None => "  (already checked)".to_string(),
        }
    } else {
        "  (first check)".to_string()
    }
}

fn push_details(out: &mut String, result: &VerificationResult) {
    if let (Some(ticket_type), Some(zone)) = (result.ticket_type, result.zone) {
        out.push_str(&format!("\n  type: {ticket_type}  zone: {zone}"));
    }
    if let (Some(origin), Some(destination)) = (&result.origin, &result.destination) {
        out.push_str(&format!("\n  route: {origin} -> {destination}"));
    }
    if let Some(expires) = result.expires_at {
        out.push_str(&format!("\n  expires: {}", fmt_ts(expires)));
    }
    if let Some(id) = &result.personalized_id {
        out.push_str(&format!("\n  personalized: {id}"));
    }
    if let Some(chain) = &result.chain {
        out.push_str(&format!("\n  chain: {chain}"));
    }
}

fn push_raw(out: &mut String, raw: &str, token: &str) {
    if raw != token {
        out.push_str(&format!("\n  raw payload: {raw}"));
    }
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
