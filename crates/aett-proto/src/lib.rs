//! Wire types for the AETT ticket backend HTTP API.
//!
//! Request/response structs matching the JSON bodies of `POST /tickets/buy`
//! and `POST /tickets/verify`, plus the fare enums shared by every client.
//! Timestamps are RFC 3339 on the wire and `DateTime<Utc>` here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fare class of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketType {
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "2h")]
    TwoHour,
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "monthly")]
    Monthly,
}

impl TicketType {
    /// Wire spelling of this fare class.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::TwoHour => "2h",
            Self::Day => "day",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "2h" => Ok(Self::TwoHour),
            "day" => Ok(Self::Day),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!(
                "unknown ticket type '{other}' (expected single, 2h, day, monthly)"
            )),
        }
    }
}

/// Fare zone of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    A,
    B,
    #[serde(rename = "AB")]
    Ab,
    #[serde(rename = "ALL")]
    All,
}

impl Zone {
    /// Wire spelling of this zone.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Ab => "AB",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "AB" => Ok(Self::Ab),
            "ALL" => Ok(Self::All),
            other => Err(format!("unknown zone '{other}' (expected A, B, AB, ALL)")),
        }
    }
}

/// Request body for `POST /tickets/buy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequest {
    pub ticket_type: TicketType,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalized_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

/// Response body for `POST /tickets/buy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyResponse {
    /// Opaque credential for the issued ticket.
    pub token: String,
    pub ticket_type: TicketType,
    pub zone: Zone,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub personalized_id: Option<String>,
    /// Authoritative expiry, set exactly once by the backend.
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub first_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub already_checked: bool,
    #[serde(default)]
    pub card_id: Option<String>,
}

/// Request body for `POST /tickets/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Response body for `POST /tickets/verify`.
///
/// The backend returns a structured body even for invalid or expired
/// tickets; every field except `valid` may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ticket_type: Option<TicketType>,
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub personalized_id: Option<String>,
    /// Audit-chain hash echoed by the backend.
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub first_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub already_checked: bool,
}
