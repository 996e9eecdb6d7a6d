//! HTTP client for the AETT ticket backend.
//!
//! Uses reqwest to call the issuance and verification endpoints. The
//! backend is the sole authority on validity, expiry, and first-use
//! tracking; this client transports, contract-checks, and normalizes, and
//! never infers a trust decision from transport-level signals.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::debug;

use aett_core::VerificationResult;
use aett_proto::{BuyRequest, BuyResponse, VerifyRequest, VerifyResponse};

/// Header carrying the static issuance API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// Default per-request timeout. A hung transport must surface as an error
/// so the UI never stays in `verifying` indefinitely.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Backend client errors.
///
/// `Api` and `Http`/`Malformed` are transport-level failures. A response
/// carrying `valid: false` is NOT an error; it comes back as a normal
/// [`VerificationResult`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response; the backend body is surfaced verbatim.
    #[error("Backend {status}: {body}")]
    Api { status: u16, body: String },

    /// 2xx response whose body violates the backend contract.
    #[error("Malformed backend response: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for connecting to a ticket backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend base URL (e.g., "<http://localhost:8000>").
    pub base_url: String,
    /// Static API key sent on every request; required for purchase,
    /// ignored by the backend for verification.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// AETT backend HTTP client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        if config.base_url.is_empty() {
            return Err(ClientError::Config("base_url is empty".into()));
        }

        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| ClientError::Config("Invalid API key format".into()))?;
            headers.insert(API_KEY_HEADER, value);
        }

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Build the URL for a given endpoint path.
    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Purchase a ticket.
    ///
    /// Non-2xx responses surface the backend body verbatim as the error
    /// detail.
    pub async fn buy(&self, request: &BuyRequest) -> Result<BuyResponse, ClientError> {
        let url = self.endpoint_url("/tickets/buy");
        debug!(%url, ticket_type = %request.ticket_type, zone = %request.zone, "buying ticket");
        let resp = self.http.post(&url).json(request).send().await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Malformed(format!("buy response: {e}")))
    }

    /// Verify a token against the backend.
    ///
    /// Exactly one request per call; retries are the caller's decision, so
    /// an accidental double "first check" can never originate here.
    /// Re-verifying a token is legitimate and expected — repetition is
    /// communicated only through the backend's `already_checked` flag.
    pub async fn verify(&self, token: &str) -> Result<VerificationResult, ClientError> {
        let url = self.endpoint_url("/tickets/verify");
        debug!(%url, "verifying token");
        let request = VerifyRequest {
            token: token.to_string(),
        };
        let resp = self.http.post(&url).json(&request).send().await?;
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        let parsed: VerifyResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Malformed(format!("verify response: {e}")))?;
        normalize(parsed)
    }

    /// Turn a non-success response into an `Api` error carrying the body.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            _ => status.canonical_reason().unwrap_or("Unknown").to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// Contract-check a verify response body and map it to the domain result.
///
/// A body claiming `valid: true` without an expiry violates the backend
/// contract and is treated as malformed rather than propagated as valid
/// data.
fn normalize(resp: VerifyResponse) -> Result<VerificationResult, ClientError> {
    if resp.valid && resp.expires_at.is_none() {
        return Err(ClientError::Malformed(
            "valid response missing expires_at".into(),
        ));
    }
    Ok(VerificationResult {
        valid: resp.valid,
        reason: resp.reason,
        expires_at: resp.expires_at,
        ticket_type: resp.ticket_type,
        zone: resp.zone,
        origin: resp.origin,
        destination: resp.destination,
        personalized_id: resp.personalized_id,
        chain: resp.chain,
        first_checked_at: resp.first_checked_at,
        already_checked: resp.already_checked,
    })
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Client construction tests
    // =========================================================================

    #[test]
    fn empty_base_url_returns_config_error() {
        let config = BackendConfig::new("");
        let err = BackendClient::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn valid_config_creates_client() {
        let config = BackendConfig::new("http://localhost:8000");
        assert!(BackendClient::new(&config).is_ok());
    }

    #[test]
    fn api_key_with_control_chars_rejected() {
        let mut config = BackendConfig::new("http://localhost:8000");
        config.api_key = Some("bad\nkey".into());
        let err = BackendClient::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn trailing_slash_stripped_from_base_url() {
        let config = BackendConfig::new("http://localhost:8000/");
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint_url("/tickets/verify"),
            "http://localhost:8000/tickets/verify"
        );
    }

    #[test]
    fn endpoint_url_constructed_correctly() {
        let config = BackendConfig::new("https://tickets.example.com");
        let client = BackendClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint_url("/tickets/buy"),
            "https://tickets.example.com/tickets/buy"
        );
    }

    // =========================================================================
    // Response normalization tests
    // =========================================================================

    fn verify_response(valid: bool) -> VerifyResponse {
        VerifyResponse {
            valid,
            reason: None,
            expires_at: valid.then(|| Utc.timestamp_opt(1_700_007_200, 0).unwrap()),
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
    fn valid_response_normalizes() {
        let result = normalize(verify_response(true)).unwrap();
        assert!(result.valid);
        assert!(result.expires_at.is_some());
    }

    #[test]
    fn invalid_response_is_a_result_not_an_error() {
        let mut resp = verify_response(false);
        resp.reason = Some("Ticket expired".into());
        let result = normalize(resp).unwrap();
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some("Ticket expired"));
    }

    #[test]
    fn valid_without_expiry_is_malformed() {
        let mut resp = verify_response(true);
        resp.expires_at = None;
        let err = normalize(resp).unwrap_err();
        assert!(matches!(err, ClientError::Malformed(_)));
    }

    #[test]
    fn invalid_without_expiry_is_fine() {
        // Unknown tokens legitimately come back with no metadata at all.
        assert!(normalize(verify_response(false)).is_ok());
    }

    #[test]
    fn already_checked_flag_carried_through() {
        let mut resp = verify_response(true);
        resp.already_checked = true;
        resp.first_checked_at = Some(Utc.timestamp_opt(1_700_000_100, 0).unwrap());
        let result = normalize(resp).unwrap();
        assert!(result.already_checked);
        assert!(result.first_checked_at.is_some());
    }
}
