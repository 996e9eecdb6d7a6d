//! Wallet and scan output formatting for the rider client.

use chrono::{DateTime, Utc};

use aett_core::{ScanState, Ticket, TicketStatus, format_remaining};

/// Render the wallet: active tickets first, then expired history.
pub fn format_wallet(tickets: &[Ticket], now: DateTime<Utc>) -> String {
    if tickets.is_empty() {
        return "No tickets yet. Buy one to get started.".to_string();
    }

    let (active, expired): (Vec<&Ticket>, Vec<&Ticket>) = tickets
        .iter()
        .partition(|t| t.status_at(now) != TicketStatus::Expired);

    let mut out = String::new();
    if !active.is_empty() {
        out.push_str("Active tickets\n");
        for ticket in active {
            out.push_str(&format_ticket(ticket, now));
            out.push('\n');
        }
    }
    if !expired.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Ticket history (expired)\n");
        for ticket in expired {
            out.push_str(&format_expired(ticket));
            out.push('\n');
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Multi-line card for one non-expired ticket.
fn format_ticket(ticket: &Ticket, now: DateTime<Utc>) -> String {
    let status = ticket.status_at(now);
    let mut out = format!(
        "{}  [{}]  {} remaining\n",
        route_or_zone(ticket),
        status.label(),
        format_remaining(ticket.expires_at, now)
    );
    out.push_str(&format!(
        "  type: {}  zone: {}\n",
        ticket.ticket_type, ticket.zone
    ));
    out.push_str(&format!("  token: {}\n", ticket.token));
    out.push_str(&format!("  expires: {}\n", fmt_ts(ticket.expires_at)));
    if let Some(id) = &ticket.personalized_id {
        out.push_str(&format!("  personalized: {id}\n"));
    }
    if let Some(first) = ticket.first_checked_at {
        let note = if ticket.already_checked {
            "re-check"
        } else {
            "first time"
        };
        out.push_str(&format!("  first checked: {} ({note})\n", fmt_ts(first)));
    }
    out
}

/// Single compact line for an expired ticket.
fn format_expired(ticket: &Ticket) -> String {
    let mut out = format!(
        "{}  [Expired]  type: {}  zone: {}  expired: {}",
        route_or_zone(ticket),
        ticket.ticket_type,
        ticket.zone,
        fmt_ts(ticket.expires_at)
    );
    if let Some(first) = ticket.first_checked_at {
        out.push_str(&format!("  first checked: {}", fmt_ts(first)));
    }
    out.push('\n');
    out
}

fn route_or_zone(ticket: &Ticket) -> String {
    match (&ticket.origin, &ticket.destination) {
        (Some(origin), Some(destination)) => format!("{origin} -> {destination}"),
        _ => format!("Zone {}", ticket.zone),
    }
}

/// Render the scan session state.
pub fn format_scan(state: &ScanState) -> String {
    match state {
        ScanState::Idle => "Waiting for QR code...".to_string(),
        ScanState::Verifying { token, .. } => format!("Verifying ticket {token}..."),
        ScanState::Valid { raw, token, result } => {
            let note = if result.already_checked {
                match result.first_checked_at {
                    Some(ts) => format!("already checked at {}", fmt_ts(ts)),
                    None => "already checked".to_string(),
                }
            } else {
                "first check".to_string()
            };
            let mut out = format!("Ticket is VALID ({note})\n  token: {token}");
            if let (Some(origin), Some(destination)) = (&result.origin, &result.destination) {
                out.push_str(&format!("\n  route: {origin} -> {destination}"));
            }
            if let (Some(ticket_type), Some(zone)) = (result.ticket_type, result.zone) {
                out.push_str(&format!("\n  type: {ticket_type}  zone: {zone}"));
            }
            if let Some(expires) = result.expires_at {
                out.push_str(&format!("\n  expires: {}", fmt_ts(expires)));
            }
            push_raw(&mut out, raw, token);
            out
        }
        ScanState::Invalid { raw, token, result } => {
            let reason = result.reason.as_deref().unwrap_or("Ticket invalid");
            let mut out = format!("Ticket is INVALID: {reason}\n  token: {token}");
            push_raw(&mut out, raw, token);
            out
        }
        ScanState::Error {
            raw,
            token,
            message,
        } => {
            let mut out = format!("Error verifying ticket: {message}\n  token: {token}");
            push_raw(&mut out, raw, token);
            out
        }
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
