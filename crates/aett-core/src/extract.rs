//! Token extraction from scanned payloads.
//!
//! QR codes in the field carry either a bare token (current scheme) or a
//! legacy JSON wrapper with a `token` or `ticket` field. Extraction never
//! rejects a payload: anything that does not look like the legacy wrapper
//! is treated as an opaque token, so a malformed scan can still be checked
//! against the backend.

/// Canonicalize a scanned payload into a token string.
///
/// The payload is trimmed, then parsed as JSON. An object with a string
/// `token` field wins, then a string `ticket` field. Anything else (parse
/// failure, non-object value, neither field, non-string field value) falls
/// through to the trimmed payload itself.
pub fn extract_token(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(token) = obj.get("token").and_then(serde_json::Value::as_str) {
            return token.to_string();
        }
        if let Some(ticket) = obj.get("ticket").and_then(serde_json::Value::as_str) {
            return ticket.to_string();
        }
    }
    raw.to_string()
}
