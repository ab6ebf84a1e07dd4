// ── View adapters ──
//
// Pure helpers that turn the reconciled host list into display values.
// No state, no I/O: callers pass in the snapshot and, for relative
// times, the current instant.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use hostwatch_api::ConnectionState;

use crate::model::{HostRecord, HostStatus};

/// Hosts older than this are shown with a calendar date.
const RELATIVE_DAYS_LIMIT: i64 = 30;

/// Per-status host counts for a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub active: usize,
    pub unreachable: usize,
}

/// Count hosts per status.
pub fn summarize(hosts: &[Arc<HostRecord>]) -> StatusSummary {
    hosts.iter().fold(StatusSummary::default(), |mut acc, host| {
        acc.total += 1;
        match host.status {
            HostStatus::Active => acc.active += 1,
            HostStatus::Unreachable => acc.unreachable += 1,
        }
        acc
    })
}

/// Whether the view should render its "no records" state.
pub fn shows_no_records(hosts: &[Arc<HostRecord>]) -> bool {
    hosts.is_empty()
}

/// `12.34 ms`, or `-` when there is no measurement.
pub fn format_response_time(ms: Option<f64>) -> String {
    match ms {
        Some(ms) => format!("{ms:.2} ms"),
        None => "-".to_owned(),
    }
}

/// Relative age of a timestamp: `42s ago`, `5m ago`, `3h ago`, `2d ago`,
/// then a plain `YYYY-MM-DD` date from 30 days on. Future timestamps
/// (clock skew) read as `0s ago`.
pub fn format_last_seen(last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(seen) = last_seen else {
        return "never".to_owned();
    };

    let secs = (now - seen).num_seconds().max(0);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 60 {
        format!("{secs}s ago")
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < RELATIVE_DAYS_LIMIT {
        format!("{days}d ago")
    } else {
        seen.format("%Y-%m-%d").to_string()
    }
}

/// Short label for the status stream badge.
pub fn connection_badge(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Open => "live",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::ClosedIntentionally => "closed",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::HostId;
    use chrono::{Duration, TimeZone};

    fn host(id: i64, status: HostStatus) -> Arc<HostRecord> {
        Arc::new(HostRecord {
            id: HostId::new(id),
            hostname: format!("node-{id}"),
            ip_address: format!("10.0.0.{id}"),
            mac_address: format!("aa:bb:cc:dd:ee:{id:02x}"),
            status,
            alive: status.is_active(),
            response_time_ms: None,
            last_seen: None,
            created_at: None,
            updated_at: None,
            metadata: serde_json::Map::new(),
        })
    }

    #[test]
    fn summary_counts_each_status() {
        let hosts = vec![
            host(1, HostStatus::Active),
            host(2, HostStatus::Unreachable),
            host(3, HostStatus::Active),
        ];
        assert_eq!(
            summarize(&hosts),
            StatusSummary {
                total: 3,
                active: 2,
                unreachable: 1
            }
        );
        assert!(!shows_no_records(&hosts));
    }

    #[test]
    fn empty_list_shows_no_records() {
        assert!(shows_no_records(&[]));
        assert_eq!(summarize(&[]), StatusSummary::default());
    }

    #[test]
    fn response_time_two_decimals() {
        assert_eq!(format_response_time(Some(12.345_6)), "12.35 ms");
        assert_eq!(format_response_time(Some(0.5)), "0.50 ms");
        assert_eq!(format_response_time(None), "-");
    }

    #[test]
    fn last_seen_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let ago = |d: Duration| format_last_seen(Some(now - d), now);

        assert_eq!(ago(Duration::seconds(42)), "42s ago");
        assert_eq!(ago(Duration::minutes(5)), "5m ago");
        assert_eq!(ago(Duration::hours(3)), "3h ago");
        assert_eq!(ago(Duration::days(2)), "2d ago");
        assert_eq!(ago(Duration::days(29)), "29d ago");
        assert_eq!(ago(Duration::days(45)), "2025-01-15");
        assert_eq!(format_last_seen(Some(now + Duration::seconds(5)), now), "0s ago");
        assert_eq!(format_last_seen(None, now), "never");
    }

    #[test]
    fn badge_per_state() {
        assert_eq!(connection_badge(ConnectionState::Open), "live");
        assert_eq!(connection_badge(ConnectionState::Disconnected), "disconnected");
    }
}
