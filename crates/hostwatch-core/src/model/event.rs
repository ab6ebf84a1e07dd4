// ── Push events ──

use chrono::{DateTime, Utc};

use super::host::{HostId, HostRecord, HostStatus};

/// Incremental change delivered over the status stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    StatusUpdate(StatusChange),
    HostRegistered { host: HostRecord },
    HostDeleted { host_id: HostId },
}

impl PushEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusUpdate(_) => "status_update",
            Self::HostRegistered { .. } => "host_registered",
            Self::HostDeleted { .. } => "host_deleted",
        }
    }

    /// The host this event targets.
    pub fn host_id(&self) -> HostId {
        match self {
            Self::StatusUpdate(change) => change.host_id,
            Self::HostRegistered { host } => host.id,
            Self::HostDeleted { host_id } => *host_id,
        }
    }
}

/// Fields carried by a `status_update` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub host_id: HostId,
    pub status: HostStatus,
    pub alive: bool,
    pub response_time_ms: Option<f64>,
    /// `None` means the frame did not carry a timestamp.
    pub last_seen: Option<DateTime<Utc>>,
}

impl StatusChange {
    /// Merge into `record`.
    ///
    /// Status, liveness and response time are overwritten. `last_seen` is
    /// only overwritten when the frame carried one.
    pub fn apply_to(&self, record: &mut HostRecord) {
        record.status = self.status;
        record.alive = self.alive || self.status.is_active();
        record.response_time_ms = self.response_time_ms;
        if let Some(seen) = self.last_seen {
            record.last_seen = Some(seen);
        }
    }
}
