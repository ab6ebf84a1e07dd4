// ── API-to-domain type conversions ──
//
// Bridges raw `hostwatch_api::models` wire types into canonical
// `hostwatch_core::model` types. Timestamps are parsed leniently and
// unknown status strings degrade to `Unreachable`.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use hostwatch_api::models::{Machine, MachineList, StatusMessage};

use crate::model::{HostId, HostRecord, HostStatus, PushEvent, Snapshot, StatusChange, StatusFilter};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_opt_timestamp(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| {
        let parsed = parse_timestamp(s);
        if parsed.is_none() {
            debug!(value = %s, "unparseable timestamp");
        }
        parsed
    })
}

fn parse_status(raw: &str) -> HostStatus {
    raw.parse().unwrap_or_else(|_| {
        debug!(status = raw, "unknown host status, treating as unreachable");
        HostStatus::Unreachable
    })
}

// ── Machine → HostRecord ───────────────────────────────────────────

impl From<Machine> for HostRecord {
    fn from(m: Machine) -> Self {
        let status = parse_status(&m.status);
        // REST records may omit the flag; derive it from the status.
        let alive = m.is_alive.unwrap_or(status.is_active()) || status.is_active();

        HostRecord {
            id: HostId::new(m.id),
            hostname: m.hostname,
            ip_address: m.ip_address,
            mac_address: m.mac_address,
            status,
            alive,
            response_time_ms: m.response_time,
            last_seen: parse_opt_timestamp(m.last_seen.as_ref()),
            created_at: parse_opt_timestamp(m.created_at.as_ref()),
            updated_at: parse_opt_timestamp(m.updated_at.as_ref()),
            metadata: m.metadata.unwrap_or_default(),
        }
    }
}

// ── MachineList → Snapshot ─────────────────────────────────────────

/// Build a snapshot tagged with the filter that was requested.
pub(crate) fn snapshot_from_list(list: MachineList, filter: StatusFilter) -> Snapshot {
    Snapshot {
        total: list.total,
        hosts: list.machines.into_iter().map(HostRecord::from).collect(),
        filter,
    }
}

// ── StatusMessage → PushEvent ──────────────────────────────────────

impl From<StatusMessage> for PushEvent {
    fn from(msg: StatusMessage) -> Self {
        match msg {
            StatusMessage::StatusUpdate {
                machine_id,
                status,
                is_alive,
                response_time,
                last_seen,
            } => PushEvent::StatusUpdate(StatusChange {
                host_id: HostId::new(machine_id),
                status: parse_status(&status),
                alive: is_alive,
                response_time_ms: response_time,
                last_seen: parse_opt_timestamp(last_seen.as_ref()),
            }),
            StatusMessage::MachineRegistered { machine } => PushEvent::HostRegistered {
                host: machine.into(),
            },
            StatusMessage::MachineDeleted { machine_id } => PushEvent::HostDeleted {
                host_id: HostId::new(machine_id),
            },
        }
    }
}
