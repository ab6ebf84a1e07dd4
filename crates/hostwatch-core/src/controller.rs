// ── State controller ──
//
// Session lifecycle for one registry: status socket wiring, snapshot
// loads with stale-result protection, confirmed deletions and the
// periodic refresh task. All host mutations flow through the DataStore.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hostwatch_api::models::{StatusMessage, UpsertMachineRequest};
use hostwatch_api::websocket::status_socket_url;
use hostwatch_api::{
    ConnectionState, Frame, ListenerId, MachinesClient, StatusSocket, TransportConfig,
};

use crate::config::ControllerConfig;
use crate::convert::snapshot_from_list;
use crate::error::CoreError;
use crate::model::{HostId, HostRecord, HostRegistration, PushEvent, StatusFilter};
use crate::store::DataStore;
use crate::stream::{HostList, HostStream};

/// Frame types the controller applies to the store.
const PUSH_EVENT_TYPES: [&str; 3] = ["status_update", "machine_registered", "machine_deleted"];

// ── SnapshotOutcome ──────────────────────────────────────────────

/// Result of a snapshot load that reached the registry successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The snapshot replaced the host set.
    Applied { count: usize, total: u64 },
    /// A newer load was initiated before this one completed; its result
    /// was dropped.
    Discarded,
}

impl SnapshotOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

// ── StateController ──────────────────────────────────────────────

/// Entry point for dashboard consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Reads go straight to the
/// [`DataStore`]; mutations are only applied once the registry confirms
/// them or the status stream reports them.
#[derive(Clone)]
pub struct StateController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    client: MachinesClient,
    /// `None` when the status stream is disabled.
    socket: Option<StatusSocket>,
    /// Fallback state channel when there is no socket.
    idle_state: watch::Sender<ConnectionState>,
    filter: watch::Sender<StatusFilter>,
    /// Child token for the current session; replaced on each `connect()`.
    cancel: Mutex<CancellationToken>,
    listeners: Mutex<Vec<(&'static str, ListenerId)>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl StateController {
    /// Build a controller. Does NOT connect -- call
    /// [`connect()`](Self::connect) to load data and start background work.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = MachinesClient::new(config.url.clone(), &transport)?;
        Self::with_client(config, client)
    }

    /// Build a controller around an existing client, e.g. one with a
    /// custom `reqwest::Client`.
    pub fn with_client(config: ControllerConfig, client: MachinesClient) -> Result<Self, CoreError> {
        let socket = if config.websocket_enabled {
            let url = match &config.stream_url {
                Some(url) => url.clone(),
                None => status_socket_url(&config.url)?,
            };
            Some(StatusSocket::new(url, config.reconnect.clone()))
        } else {
            None
        };
        Ok(Self::from_parts(config, client, socket))
    }

    fn from_parts(
        config: ControllerConfig,
        client: MachinesClient,
        socket: Option<StatusSocket>,
    ) -> Self {
        let (idle_state, _) = watch::channel(ConnectionState::Disconnected);
        let (filter, _) = watch::channel(config.filter);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(DataStore::new()),
                client,
                socket,
                idle_state,
                filter,
                cancel: Mutex::new(CancellationToken::new()),
                listeners: Mutex::new(Vec::new()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Start a session.
    ///
    /// Wires push events into the store, opens the status socket, loads
    /// the initial snapshot for the current filter and spawns the periodic
    /// refresh. If the initial load fails the session is torn down again
    /// and the error is returned.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let cancel = {
            let mut guard = self.inner.cancel.lock().await;
            guard.cancel();
            *guard = CancellationToken::new();
            guard.clone()
        };

        if let Some(socket) = &self.inner.socket {
            self.register_listeners(socket).await;
            socket.connect();
        }

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial snapshot load failed");
            self.disconnect().await;
            return Err(e);
        }

        let period = self.inner.config.refresh_interval;
        if period.is_zero() {
            debug!("periodic refresh disabled");
        } else {
            let handle = tokio::spawn(refresh_task(self.clone(), period, cancel));
            self.inner.task_handles.lock().await.push(handle);
        }

        info!(url = %self.inner.config.url, "controller connected");
        Ok(())
    }

    /// End the session: close the socket, drop push listeners and stop
    /// background tasks. In-flight snapshot loads are not cancelled; the
    /// generation check keeps them from clobbering later state.
    pub async fn disconnect(&self) {
        self.inner.cancel.lock().await.cancel();

        if let Some(socket) = &self.inner.socket {
            socket.close();
            for (event, id) in self.inner.listeners.lock().await.drain(..) {
                socket.off(event, id);
            }
        }

        let handles: Vec<JoinHandle<()>> =
            self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                debug!(error = %e, "background task ended abnormally");
            }
        }

        debug!("controller disconnected");
    }

    async fn register_listeners(&self, socket: &StatusSocket) {
        let mut listeners = self.inner.listeners.lock().await;
        if !listeners.is_empty() {
            return;
        }
        for event in PUSH_EVENT_TYPES {
            let store = Arc::clone(&self.inner.store);
            let id = socket.on(event, move |frame: &Frame| {
                let msg = StatusMessage::deserialize(&**frame)?;
                store.apply_push_event(&PushEvent::from(msg));
                Ok(())
            });
            listeners.push((event, id));
        }
    }

    // ── Snapshot loads ───────────────────────────────────────────

    /// Fetch a snapshot for `filter` and replace the host set with it.
    ///
    /// Only the most recently initiated load may apply; an older one that
    /// completes later yields [`SnapshotOutcome::Discarded`]. On failure
    /// the host set is left as it was.
    pub async fn load_snapshot(&self, filter: StatusFilter) -> Result<SnapshotOutcome, CoreError> {
        let generation = self.inner.store.begin_load();
        debug!(generation, %filter, "loading snapshot");

        let list = self.inner.client.list_machines(filter.query_value()).await?;
        let snapshot = snapshot_from_list(list, filter);
        let (count, total) = (snapshot.hosts.len(), snapshot.total);

        if self.inner.store.apply_snapshot(generation, snapshot) {
            Ok(SnapshotOutcome::Applied { count, total })
        } else {
            Ok(SnapshotOutcome::Discarded)
        }
    }

    /// Reload the snapshot for the current filter.
    pub async fn refresh(&self) -> Result<SnapshotOutcome, CoreError> {
        self.load_snapshot(self.status_filter()).await
    }

    /// Change the active filter and load a matching snapshot.
    ///
    /// Push events keep applying to the current host set, whatever their
    /// status, until the new snapshot lands.
    pub async fn set_filter(&self, filter: StatusFilter) -> Result<SnapshotOutcome, CoreError> {
        self.inner.filter.send_replace(filter);
        info!(%filter, "status filter changed");
        self.load_snapshot(filter).await
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Apply a push event to the host set. Returns `true` if it changed.
    pub fn apply_push_event(&self, event: &PushEvent) -> bool {
        self.inner.store.apply_push_event(event)
    }

    /// Delete a host at the registry, then locally.
    ///
    /// The host is only removed from the local set after the registry
    /// confirms; on failure the set is untouched.
    pub async fn delete_host(&self, id: HostId) -> Result<(), CoreError> {
        match self.inner.client.delete_machine(id.get()).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Err(CoreError::HostNotFound { id: id.to_string() });
            }
            Err(e) => {
                warn!(host = %id, error = %e, "delete failed");
                return Err(e.into());
            }
        }

        self.inner.store.remove_host(id);
        info!(host = %id, "host deleted");
        Ok(())
    }

    /// Register or update a host by IP, then upsert the confirmed record.
    pub async fn register_host(
        &self,
        registration: HostRegistration,
    ) -> Result<Arc<HostRecord>, CoreError> {
        let request = UpsertMachineRequest {
            ip_address: registration.ip_address,
            hostname: registration.hostname,
            mac_address: registration.mac_address,
            metadata: registration.metadata,
        };
        let machine = self.inner.client.upsert_machine(&request).await?;
        let record = HostRecord::from(machine);
        let id = record.id;
        self.inner.store.upsert_host(record);
        info!(host = %id, ip = %request.ip_address, "host registered");

        self.inner
            .store
            .host(id)
            .ok_or_else(|| CoreError::Internal(format!("host {id} missing after upsert")))
    }

    // ── State accessors ──────────────────────────────────────────

    /// Subscribe to host list changes.
    pub fn hosts(&self) -> HostStream {
        self.inner.store.subscribe_hosts()
    }

    pub fn hosts_snapshot(&self) -> HostList {
        self.inner.store.hosts_snapshot()
    }

    /// The filter selected by the operator.
    pub fn status_filter(&self) -> StatusFilter {
        *self.inner.filter.borrow()
    }

    /// The filter of the snapshot currently held. Differs from
    /// [`status_filter()`](Self::status_filter) while a load is in flight.
    pub fn snapshot_filter(&self) -> Option<StatusFilter> {
        self.inner.store.snapshot_filter()
    }

    pub fn total(&self) -> u64 {
        self.inner.store.total()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_full_refresh()
    }

    pub fn last_push_event(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_push_event()
    }

    /// Status socket state. Stays `Disconnected` when the stream is disabled.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        match &self.inner.socket {
            Some(socket) => socket.state(),
            None => self.inner.idle_state.subscribe(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.socket.as_ref().is_some_and(StatusSocket::is_connected)
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner
            .socket
            .as_ref()
            .map_or(0, StatusSocket::reconnect_attempts)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Reload the snapshot for the current filter every `period`.
async fn refresh_task(controller: StateController, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match controller.refresh().await {
                    Ok(SnapshotOutcome::Applied { count, .. }) => debug!(count, "periodic refresh"),
                    Ok(SnapshotOutcome::Discarded) => debug!("periodic refresh superseded"),
                    Err(e) => warn!(error = %e, "periodic refresh failed"),
                }
            }
        }
    }
}
