// ── Host domain types ──

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── HostId ──────────────────────────────────────────────────────────

/// Stable registry identifier of a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(i64);

impl HostId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HostId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for HostId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

// ── HostStatus ──────────────────────────────────────────────────────

/// Reachability as reported by the monitoring service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HostStatus {
    Active,
    Unreachable,
}

impl HostStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

// ── HostRecord ──────────────────────────────────────────────────────

/// A monitored host as the dashboard knows it.
///
/// `status == Active` always implies `alive`; conversion and status merges
/// normalize the flag accordingly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: HostId,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
    pub status: HostStatus,
    pub alive: bool,
    /// Last round-trip time in milliseconds, if the last probe succeeded.
    pub response_time_ms: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

// ── HostRegistration ───────────────────────────────────────────────

/// Operator request to register (or update) a host by IP address.
#[derive(Debug, Clone, PartialEq)]
pub struct HostRegistration {
    pub ip_address: String,
    pub hostname: String,
    pub mac_address: String,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
