// Wire types for the machine registry.
//
// These mirror the JSON the registry emits. The upstream service and its
// reference frontend disagree on a few field names (`extra_data` vs.
// `metadata`, `registered_at` vs. `created_at`); both spellings are
// accepted. Timestamps stay as strings here -- `hostwatch-core` parses them.

use serde::{Deserialize, Serialize};

/// A machine record as returned by `GET /api/machines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub hostname: String,
    pub ip_address: String,
    pub mac_address: String,
    /// `"active"` or `"unreachable"`.
    pub status: String,
    /// Absent in some registry versions; derived from `status` downstream.
    #[serde(default)]
    pub is_alive: Option<bool>,
    /// Last ping round-trip in milliseconds.
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default, alias = "registered_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, alias = "extra_data")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Response body of `GET /api/machines`.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineList {
    pub machines: Vec<Machine>,
    pub total: u64,
    #[serde(default)]
    pub status_filter: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

/// Body of `PUT /api/machines/{ip_address}`.
///
/// Metadata goes out under `metadata`. Registries that store it as
/// `extra_data` ignore the key, so the host is registered without it.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertMachineRequest {
    pub ip_address: String,
    pub hostname: String,
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A typed frame from the `/ws/status` stream.
///
/// Frames are routed as raw JSON first (see [`EventRouter`](crate::EventRouter));
/// listeners decode into this enum when they care about the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusMessage {
    StatusUpdate {
        machine_id: i64,
        status: String,
        is_alive: bool,
        #[serde(default)]
        response_time: Option<f64>,
        #[serde(default)]
        last_seen: Option<String>,
    },
    MachineRegistered {
        machine: Machine,
    },
    MachineDeleted {
        machine_id: i64,
    },
}
