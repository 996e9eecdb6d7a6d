//! Scan session state machine.
//!
//! Turns a stream of raw scan events into verification attempts:
//! extraction, duplicate suppression, and a stale-response guard so a slow
//! backend response for one token can never overwrite state for a newer
//! one. Network I/O stays with the caller; the session only tracks state.

use crate::extract::extract_token;
use crate::ticket::VerificationResult;

/// Session state for one scan/verify cycle.
///
/// The whole value is replaced on every transition, so fields from a
/// previous attempt cannot leak into the display of a new one. `raw` and
/// `token` stay visible in every terminal state for manual cross-checking.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScanState {
    /// Nothing scanned yet.
    #[default]
    Idle,
    /// A verification request for `token` is in flight.
    Verifying {
        attempt: u64,
        raw: String,
        token: String,
    },
    /// The backend confirmed the ticket.
    Valid {
        raw: String,
        token: String,
        result: VerificationResult,
    },
    /// The backend returned a well-formed `valid: false`.
    Invalid {
        raw: String,
        token: String,
        result: VerificationResult,
    },
    /// Transport-level failure; distinct from an invalid ticket.
    Error {
        raw: String,
        token: String,
        message: String,
    },
}

/// A verification the caller should now perform against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScan {
    pub attempt: u64,
    pub token: String,
}

/// Tracks the current scan/verify cycle for one device.
#[derive(Debug, Default)]
pub struct ScanSession {
    state: ScanState,
    attempts: u64,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    /// Feed a raw scan event.
    ///
    /// Returns the verification to run, or `None` when the scan is
    /// suppressed: empty payloads, a token whose verification is already in
    /// flight, or a token whose last outcome was `Valid`. Invalid and error
    /// outcomes may always be re-scanned — suppression is a courtesy to the
    /// backend, not a trust decision.
    pub fn handle_scan(&mut self, raw: &str) -> Option<PendingScan> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let token = extract_token(raw);
        match &self.state {
            ScanState::Verifying { token: current, .. } if *current == token => return None,
            ScanState::Valid { token: last, .. } if *last == token => return None,
            _ => {}
        }
        self.attempts += 1;
        let attempt = self.attempts;
        self.state = ScanState::Verifying {
            attempt,
            raw: raw.to_string(),
            token: token.clone(),
        };
        Some(PendingScan { attempt, token })
    }

    /// Apply the outcome of a verification attempt.
    ///
    /// Only the attempt currently in flight may resolve the session; a
    /// late response for a superseded scan is discarded. Returns whether
    /// the state changed.
    pub fn resolve(
        &mut self,
        attempt: u64,
        outcome: Result<VerificationResult, String>,
    ) -> bool {
        let ScanState::Verifying {
            attempt: current,
            raw,
            token,
        } = &self.state
        else {
            return false;
        };
        if *current != attempt {
            return false;
        }
        let raw = raw.clone();
        let token = token.clone();
        self.state = match outcome {
            Ok(result) if result.valid => ScanState::Valid { raw, token, result },
            Ok(result) => ScanState::Invalid { raw, token, result },
            Err(message) => ScanState::Error {
                raw,
                token,
                message,
            },
        };
        true
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn result(valid: bool) -> VerificationResult {
        VerificationResult {
            valid,
            reason: None,
            expires_at: valid.then(|| ts(7_200)),
            ticket_type: None,
            zone: None,
            origin: None,
            destination: None,
            personalized_id: None,
            chain: None,
            first_checked_at: None,
            already_checked: false,
        }
    }

    #[test]
    fn new_session_is_idle() {
        let session = ScanSession::new();
        assert_eq!(*session.state(), ScanState::Idle);
    }

    #[test]
    fn scan_starts_verification() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        assert_eq!(pending.token, "T1");
        assert!(matches!(
            session.state(),
            ScanState::Verifying { token, .. } if token == "T1"
        ));
    }

    #[test]
    fn empty_payload_ignored() {
        let mut session = ScanSession::new();
        assert!(session.handle_scan("").is_none());
        assert!(session.handle_scan("   \n").is_none());
        assert_eq!(*session.state(), ScanState::Idle);
    }

    #[test]
    fn legacy_payload_extracts_token() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan(r#"{"ticket":"LEGACY-1"}"#).unwrap();
        assert_eq!(pending.token, "LEGACY-1");
        // The raw payload stays around for display.
        assert!(matches!(
            session.state(),
            ScanState::Verifying { raw, .. } if raw == r#"{"ticket":"LEGACY-1"}"#
        ));
    }

    #[test]
    fn repeat_scan_while_in_flight_suppressed() {
        let mut session = ScanSession::new();
        session.handle_scan("T1").unwrap();
        assert!(session.handle_scan("T1").is_none());
        // Same token through the legacy wrapper is still the same token.
        assert!(session.handle_scan(r#"{"token":"T1"}"#).is_none());
    }

    #[test]
    fn repeat_scan_after_valid_suppressed() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        assert!(session.resolve(pending.attempt, Ok(result(true))));
        assert!(session.handle_scan("T1").is_none());
        assert!(matches!(session.state(), ScanState::Valid { .. }));
    }

    #[test]
    fn rescan_after_invalid_allowed() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        session.resolve(pending.attempt, Ok(result(false)));
        assert!(session.handle_scan("T1").is_some());
    }

    #[test]
    fn rescan_after_error_allowed() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        session.resolve(pending.attempt, Err("connection refused".into()));
        assert!(session.handle_scan("T1").is_some());
    }

    #[test]
    fn different_token_always_starts_fresh_attempt() {
        let mut session = ScanSession::new();
        let first = session.handle_scan("T1").unwrap();
        let second = session.handle_scan("T2").unwrap();
        assert_ne!(first.attempt, second.attempt);
        assert!(matches!(
            session.state(),
            ScanState::Verifying { token, .. } if token == "T2"
        ));
    }

    #[test]
    fn stale_response_discarded() {
        // Scan T1, then T2 before T1's response lands. The late T1 response
        // must not overwrite T2's in-flight state.
        let mut session = ScanSession::new();
        let first = session.handle_scan("T1").unwrap();
        let second = session.handle_scan("T2").unwrap();

        assert!(!session.resolve(first.attempt, Ok(result(true))));
        assert!(matches!(
            session.state(),
            ScanState::Verifying { token, .. } if token == "T2"
        ));

        assert!(session.resolve(second.attempt, Ok(result(true))));
        assert!(matches!(
            session.state(),
            ScanState::Valid { token, .. } if token == "T2"
        ));
    }

    #[test]
    fn resolve_without_scan_discarded() {
        let mut session = ScanSession::new();
        assert!(!session.resolve(1, Ok(result(true))));
        assert_eq!(*session.state(), ScanState::Idle);
    }

    #[test]
    fn resolve_after_terminal_state_discarded() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        assert!(session.resolve(pending.attempt, Ok(result(true))));
        // A duplicate delivery of the same outcome changes nothing.
        assert!(!session.resolve(pending.attempt, Ok(result(false))));
        assert!(matches!(session.state(), ScanState::Valid { .. }));
    }

    #[test]
    fn invalid_outcome_is_terminal_with_result() {
        let mut session = ScanSession::new();
        let pending = session.handle_scan("T1").unwrap();
        let mut invalid = result(false);
        invalid.reason = Some("Ticket expired".into());
        session.resolve(pending.attempt, Ok(invalid));
        match session.state() {
            ScanState::Invalid { token, result, .. } => {
                assert_eq!(token, "T1");
                assert_eq!(result.reason.as_deref(), Some("Ticket expired"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn error_outcome_keeps_token_and_raw() {
        let mut session = ScanSession::new();
        let raw = r#"{"token":"T1"}"#;
        let pending = session.handle_scan(raw).unwrap();
        session.resolve(pending.attempt, Err("timeout".into()));
        match session.state() {
            ScanState::Error {
                raw: r,
                token,
                message,
            } => {
                assert_eq!(r, raw);
                assert_eq!(token, "T1");
                assert_eq!(message, "timeout");
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn no_stale_fields_survive_new_attempt() {
        // A fully populated valid result for T1 must leave no trace once T2
        // starts verifying: the state is replaced wholesale.
        let mut session = ScanSession::new();
        let first = session.handle_scan("T1").unwrap();
        let mut full = result(true);
        full.chain = Some("deadbeef".into());
        full.already_checked = true;
        session.resolve(first.attempt, Ok(full));

        session.handle_scan("T2").unwrap();
        match session.state() {
            ScanState::Verifying { attempt, raw, token } => {
                assert_eq!(*attempt, 2);
                assert_eq!(raw, "T2");
                assert_eq!(token, "T2");
            }
            other => panic!("expected Verifying, got {other:?}"),
        }
    }
}
