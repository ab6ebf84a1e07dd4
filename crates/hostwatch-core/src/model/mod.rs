// ── Domain model ──
//
// Canonical host types consumed by the store, the controller and the
// view adapters. Wire shapes live in `hostwatch_api::models`; `convert`
// bridges the two.

pub mod event;
pub mod filter;
pub mod host;

pub use event::{PushEvent, StatusChange};
pub use filter::{Snapshot, StatusFilter};
pub use host::{HostId, HostRecord, HostRegistration, HostStatus};
