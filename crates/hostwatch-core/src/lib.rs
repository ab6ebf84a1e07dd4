//! Reactive host state between `hostwatch-api` and dashboard consumers.
//!
//! - **[`StateController`]**: owns the status socket and the REST client.
//!   [`connect()`](StateController::connect) loads an initial snapshot, wires
//!   push events into the store and starts the periodic refresh.
//!   Snapshot loads are generation-checked so a superseded response is
//!   discarded instead of overwriting newer data.
//!
//! - **[`DataStore`]**: the canonical host set. Mutations are serialized
//!   behind one write lock and published as immutable snapshots over a
//!   `tokio::sync::watch` channel.
//!
//! - **[`HostStream`]**: subscription handle with `current()` and
//!   `changed()`, or a `Stream` via `into_stream()` for live rendering.
//!
//! - **[`view`]**: pure render helpers (summary counts, relative times,
//!   connection badge).

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ControllerConfig;
pub use controller::{SnapshotOutcome, StateController};
pub use error::CoreError;
pub use model::{
    HostId, HostRecord, HostRegistration, HostStatus, PushEvent, Snapshot, StatusChange,
    StatusFilter,
};
pub use store::DataStore;
pub use stream::{HostList, HostStream, HostWatchStream};

pub use hostwatch_api::{ConnectionState, ReconnectConfig, TlsMode};
