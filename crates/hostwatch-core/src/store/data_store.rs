// ── Central reactive data store ──
//
// Canonical host set for one controller session. Every mutation runs in
// one write section and publishes a fully-applied snapshot over `watch`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, trace};

use super::collection::HostCollection;
use crate::model::{HostId, HostRecord, PushEvent, Snapshot, StatusFilter};
use crate::stream::HostStream;

/// Canonical host storage shared by the controller and its readers.
///
/// Writers serialize on an internal lock; readers only ever see complete
/// snapshots through [`hosts_snapshot()`](Self::hosts_snapshot) or a
/// [`HostStream`].
#[derive(Debug)]
pub struct DataStore {
    state: RwLock<StoreState>,
    hosts: watch::Sender<Arc<Vec<Arc<HostRecord>>>>,
    /// Generation of the most recently initiated snapshot load.
    load_generation: AtomicU64,
    pub(crate) last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_push_event: watch::Sender<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default)]
struct StoreState {
    collection: HostCollection,
    /// Filter of the snapshot currently held; `None` before the first load.
    snapshot_filter: Option<StatusFilter>,
    total: u64,
}

impl DataStore {
    pub fn new() -> Self {
        let (hosts, _) = watch::channel(Arc::new(Vec::new()));
        let (last_full_refresh, _) = watch::channel(None);
        let (last_push_event, _) = watch::channel(None);

        Self {
            state: RwLock::new(StoreState::default()),
            hosts,
            load_generation: AtomicU64::new(0),
            last_full_refresh,
            last_push_event,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// Current host list (cheap `Arc` clone).
    pub fn hosts_snapshot(&self) -> Arc<Vec<Arc<HostRecord>>> {
        self.hosts.borrow().clone()
    }

    /// Subscribe to host list changes.
    pub fn subscribe_hosts(&self) -> HostStream {
        HostStream::new(self.hosts.subscribe())
    }

    pub fn host(&self, id: HostId) -> Option<Arc<HostRecord>> {
        self.read_state().collection.get(id)
    }

    /// Total reported by the registry with the last applied snapshot.
    pub fn total(&self) -> u64 {
        self.read_state().total
    }

    /// Filter that produced the snapshot currently held.
    pub fn snapshot_filter(&self) -> Option<StatusFilter> {
        self.read_state().snapshot_filter
    }

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        *self.last_push_event.borrow()
    }

    // ── Snapshot loads ───────────────────────────────────────────────

    /// Reserve a generation for a snapshot load about to be issued.
    pub(crate) fn begin_load(&self) -> u64 {
        self.load_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the whole host set with `snapshot`, unless a newer load has
    /// been initiated since `generation` was reserved.
    ///
    /// Returns `false` when the snapshot was discarded as stale.
    pub(crate) fn apply_snapshot(&self, generation: u64, snapshot: Snapshot) -> bool {
        let mut state = self.write_state();
        // Checked under the write lock so a newer load cannot land between
        // the check and the replace.
        let latest = self.load_generation.load(Ordering::SeqCst);
        if generation != latest {
            debug!(generation, latest, "discarding superseded snapshot");
            return false;
        }

        let count = snapshot.hosts.len();
        state.collection.replace_all(snapshot.hosts);
        state.snapshot_filter = Some(snapshot.filter);
        state.total = snapshot.total;
        self.publish(&state);
        drop(state);

        self.last_full_refresh.send_replace(Some(Utc::now()));
        debug!(count, total = snapshot.total, filter = %snapshot.filter, "snapshot applied");
        true
    }

    // ── Push events and confirmed mutations ──────────────────────────

    /// Apply a push event. Returns `true` if the host set changed.
    ///
    /// Every variant is idempotent: replaying an event leaves the same state.
    pub(crate) fn apply_push_event(&self, event: &PushEvent) -> bool {
        let mut state = self.write_state();
        let changed = match event {
            PushEvent::StatusUpdate(change) => state.collection.merge_status(change),
            PushEvent::HostRegistered { host } => {
                state.collection.upsert(host.clone());
                true
            }
            PushEvent::HostDeleted { host_id } => state.collection.remove(*host_id).is_some(),
        };
        if changed {
            self.publish(&state);
        }
        drop(state);

        self.last_push_event.send_replace(Some(Utc::now()));
        trace!(kind = event.kind(), host = %event.host_id(), changed, "push event applied");
        changed
    }

    /// Insert or replace a host confirmed by the registry.
    pub(crate) fn upsert_host(&self, host: HostRecord) -> bool {
        let mut state = self.write_state();
        let is_new = state.collection.upsert(host);
        self.publish(&state);
        is_new
    }

    /// Remove a host whose deletion the registry confirmed.
    pub(crate) fn remove_host(&self, id: HostId) -> Option<Arc<HostRecord>> {
        let mut state = self.write_state();
        let removed = state.collection.remove(id);
        if removed.is_some() {
            self.publish(&state);
        }
        removed
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Broadcast the collection to subscribers. Called with the write lock
    /// held so publications follow mutation order.
    fn publish(&self, state: &RwLockWriteGuard<'_, StoreState>) {
        // `send_replace` updates unconditionally, even with zero receivers.
        self.hosts.send_replace(state.collection.snapshot());
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
