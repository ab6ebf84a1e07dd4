// ── Reactive data store ──
//
// Canonical host storage with push-based change notification.

mod collection;
mod data_store;

pub use data_store::DataStore;
