//! Ticket lifecycle status derived from expiry.
//!
//! Status is never stored: it is recomputed from `(expires_at, now)` on
//! every evaluation, so display layers re-check it on a fixed cadence
//! against a live clock. The tick is read-only and never triggers network
//! calls.

use chrono::{DateTime, Utc};

/// Seconds before expiry during which a ticket counts as expiring.
pub const EXPIRING_WINDOW_SECS: i64 = 5 * 60;

/// Derived lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TicketStatus {
    Active,
    Expiring,
    Expired,
}

impl TicketStatus {
    /// Human label used by both clients.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Expiring => "Expiring soon",
            Self::Expired => "Expired",
        }
    }
}

/// Compute the status of a ticket expiring at `expires_at` as of `now`.
///
/// Monotone in `now`: as time passes, status only ever moves
/// active → expiring → expired.
pub fn status_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> TicketStatus {
    let remaining = expires_at.signed_duration_since(now).num_seconds();
    if remaining <= 0 {
        TicketStatus::Expired
    } else if remaining <= EXPIRING_WINDOW_SECS {
        TicketStatus::Expiring
    } else {
        TicketStatus::Active
    }
}

/// Render the time remaining until `expires_at`.
///
/// Precision shrinks as magnitude grows: seconds matter for a ticket in its
/// last hour, not for a monthly pass. Never renders a negative duration;
/// past expiry this is simply "Expired".
pub fn format_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = expires_at.signed_duration_since(now).num_seconds();
    if secs <= 0 {
        return "Expired".to_string();
    }
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    if days > 0 {
        format!("{days} d {hours:02} h")
    } else if secs >= 3_600 {
        format!("{} h {minutes:02} min", secs / 3_600)
    } else {
        format!("{minutes} min {seconds:02} s")
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn active_outside_expiring_window() {
        assert_eq!(status_at(at(EXPIRING_WINDOW_SECS + 1), at(0)), TicketStatus::Active);
        assert_eq!(status_at(at(7_200), at(0)), TicketStatus::Active);
    }

    #[test]
    fn expiring_within_window() {
        assert_eq!(status_at(at(EXPIRING_WINDOW_SECS), at(0)), TicketStatus::Expiring);
        assert_eq!(status_at(at(1), at(0)), TicketStatus::Expiring);
    }

    #[test]
    fn expired_at_and_after_expiry() {
        assert_eq!(status_at(at(0), at(0)), TicketStatus::Expired);
        assert_eq!(status_at(at(0), at(3_600)), TicketStatus::Expired);
    }

    #[test]
    fn status_monotone_as_time_passes() {
        // For a fixed expiry, advancing the clock must never move the
        // status backwards.
        let expires = at(10_000);
        let mut last = TicketStatus::Active;
        for offset in (0..12_000).step_by(13) {
            let status = status_at(expires, at(offset));
            assert!(status >= last, "status regressed at offset {offset}");
            last = status;
        }
        assert_eq!(last, TicketStatus::Expired);
    }

    #[test]
    fn remaining_sub_hour_shows_minutes_seconds() {
        assert_eq!(format_remaining(at(90), at(0)), "1 min 30 s");
        assert_eq!(format_remaining(at(59), at(0)), "0 min 59 s");
        assert_eq!(format_remaining(at(3_599), at(0)), "59 min 59 s");
    }

    #[test]
    fn remaining_multi_hour_shows_hours_minutes() {
        assert_eq!(format_remaining(at(3_600), at(0)), "1 h 00 min");
        assert_eq!(format_remaining(at(2 * 3_600 + 5 * 60), at(0)), "2 h 05 min");
    }

    #[test]
    fn remaining_multi_day_shows_days_hours() {
        assert_eq!(format_remaining(at(3 * 86_400 + 4 * 3_600), at(0)), "3 d 04 h");
        assert_eq!(format_remaining(at(30 * 86_400), at(0)), "30 d 00 h");
    }

    #[test]
    fn remaining_never_negative() {
        assert_eq!(format_remaining(at(0), at(0)), "Expired");
        assert_eq!(format_remaining(at(0), at(9_999)), "Expired");
    }

    #[test]
    fn labels() {
        assert_eq!(TicketStatus::Active.label(), "Active");
        assert_eq!(TicketStatus::Expiring.label(), "Expiring soon");
        assert_eq!(TicketStatus::Expired.label(), "Expired");
    }
}
