// ── Ordered host collection ──
//
// Insertion-ordered map keyed by `HostId`. Not synchronized on its own:
// `DataStore` keeps it behind a single write lock and publishes the
// snapshots it builds.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{HostId, HostRecord, StatusChange};

#[derive(Debug, Default)]
pub(crate) struct HostCollection {
    by_id: IndexMap<HostId, Arc<HostRecord>>,
}

impl HostCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drop everything and take `hosts` in the given order.
    ///
    /// A duplicated id keeps its first position and its last value.
    pub(crate) fn replace_all(&mut self, hosts: Vec<HostRecord>) {
        self.by_id.clear();
        self.by_id.reserve(hosts.len());
        for host in hosts {
            self.by_id.insert(host.id, Arc::new(host));
        }
    }

    /// Insert or fully replace a host. Returns `true` if the id was new.
    ///
    /// A replaced host keeps its position; a new one is appended.
    pub(crate) fn upsert(&mut self, host: HostRecord) -> bool {
        self.by_id.insert(host.id, Arc::new(host)).is_none()
    }

    /// Merge a status change into an existing host.
    ///
    /// Returns `false` (and changes nothing) when the id is unknown.
    pub(crate) fn merge_status(&mut self, change: &StatusChange) -> bool {
        let Some(slot) = self.by_id.get_mut(&change.host_id) else {
            return false;
        };
        let mut updated = HostRecord::clone(slot);
        change.apply_to(&mut updated);
        *slot = Arc::new(updated);
        true
    }

    /// Remove a host, preserving the order of the rest.
    pub(crate) fn remove(&mut self, id: HostId) -> Option<Arc<HostRecord>> {
        self.by_id.shift_remove(&id)
    }

    pub(crate) fn get(&self, id: HostId) -> Option<Arc<HostRecord>> {
        self.by_id.get(&id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Ordered view of the current contents (cheap `Arc` clones).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<HostRecord>>> {
        Arc::new(self.by_id.values().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::HostStatus;
    use pretty_assertions::assert_eq;

    fn host(id: i64, status: HostStatus) -> HostRecord {
        HostRecord {
            id: HostId::new(id),
            hostname: format!("node-{id}"),
            ip_address: format!("10.0.0.{id}"),
            mac_address: format!("aa:bb:cc:dd:ee:{id:02x}"),
            status,
            alive: status.is_active(),
            response_time_ms: status.is_active().then_some(1.5),
            last_seen: None,
            created_at: None,
            updated_at: None,
            metadata: serde_json::Map::new(),
        }
    }

    fn ids(c: &HostCollection) -> Vec<i64> {
        c.snapshot().iter().map(|h| h.id.get()).collect()
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let mut c = HostCollection::new();
        c.replace_all(vec![host(1, HostStatus::Active), host(2, HostStatus::Active)]);
        c.replace_all(vec![host(3, HostStatus::Unreachable)]);
        assert_eq!(ids(&c), vec![3]);
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_new() {
        let mut c = HostCollection::new();
        c.replace_all(vec![host(1, HostStatus::Active), host(2, HostStatus::Active)]);

        let mut renamed = host(1, HostStatus::Unreachable);
        renamed.hostname = "renamed".into();
        assert!(!c.upsert(renamed.clone()));
        assert!(c.upsert(host(3, HostStatus::Active)));

        assert_eq!(ids(&c), vec![1, 2, 3]);
        assert_eq!(*c.get(HostId::new(1)).unwrap(), renamed);
    }

    #[test]
    fn merge_status_for_unknown_id_is_noop() {
        let mut c = HostCollection::new();
        c.replace_all(vec![host(1, HostStatus::Active)]);
        let before = c.snapshot();

        let change = StatusChange {
            host_id: HostId::new(99),
            status: HostStatus::Unreachable,
            alive: false,
            response_time_ms: None,
            last_seen: None,
        };
        assert!(!c.merge_status(&change));
        assert_eq!(*c.snapshot(), *before);
    }

    #[test]
    fn merge_status_overwrites_listed_fields_only() {
        let mut c = HostCollection::new();
        c.replace_all(vec![host(1, HostStatus::Active)]);

        let change = StatusChange {
            host_id: HostId::new(1),
            status: HostStatus::Unreachable,
            alive: false,
            response_time_ms: None,
            last_seen: None,
        };
        assert!(c.merge_status(&change));

        let merged = c.get(HostId::new(1)).unwrap();
        assert_eq!(merged.status, HostStatus::Unreachable);
        assert!(!merged.alive);
        assert_eq!(merged.response_time_ms, None);
        assert_eq!(merged.hostname, "node-1");
    }

    #[test]
    fn remove_is_idempotent_and_keeps_order() {
        let mut c = HostCollection::new();
        c.replace_all(vec![
            host(1, HostStatus::Active),
            host(2, HostStatus::Active),
            host(3, HostStatus::Active),
        ]);

        assert!(c.remove(HostId::new(2)).is_some());
        assert!(c.remove(HostId::new(2)).is_none());
        assert_eq!(ids(&c), vec![1, 3]);
        assert_eq!(c.len(), 2);
    }
}
