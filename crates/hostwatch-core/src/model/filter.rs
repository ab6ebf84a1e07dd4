// ── Status filter and snapshots ──

use std::fmt;
use std::str::FromStr;

use super::host::{HostRecord, HostStatus};

/// Active status filter. `None` means every host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StatusFilter(Option<HostStatus>);

impl StatusFilter {
    pub const ALL: Self = Self(None);

    pub fn only(status: HostStatus) -> Self {
        Self(Some(status))
    }

    pub fn status(self) -> Option<HostStatus> {
        self.0
    }

    /// Value for the `status` query parameter, if any.
    pub fn query_value(self) -> Option<&'static str> {
        self.0.map(|s| match s {
            HostStatus::Active => "active",
            HostStatus::Unreachable => "unreachable",
        })
    }
}

impl From<Option<HostStatus>> for StatusFilter {
    fn from(status: Option<HostStatus>) -> Self {
        Self(status)
    }
}

impl From<HostStatus> for StatusFilter {
    fn from(status: HostStatus) -> Self {
        Self(Some(status))
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, "{status}"),
            None => f.write_str("all"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL);
        }
        s.parse().map(Self::only)
    }
}

/// Point-in-time host list from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub hosts: Vec<HostRecord>,
    pub total: u64,
    /// The filter that produced this snapshot.
    pub filter: StatusFilter,
}
