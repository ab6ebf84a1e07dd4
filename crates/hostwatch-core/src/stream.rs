// ── Reactive host stream ──
//
// Subscription type for consuming host list changes from the DataStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::HostRecord;

/// Shared, immutable host list as published by the store.
pub type HostList = Arc<Vec<Arc<HostRecord>>>;

/// A subscription to the host list.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
#[derive(Debug)]
pub struct HostStream {
    current: HostList,
    receiver: watch::Receiver<HostList>,
}

impl HostStream {
    pub(crate) fn new(receiver: watch::Receiver<HostList>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> &HostList {
        &self.current
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<HostList> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` yielding the current list, then every change.
    pub fn into_stream(self) -> HostWatchStream {
        HostWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Intermediate snapshots may be skipped; the most recent one is always
/// delivered.
pub struct HostWatchStream {
    inner: WatchStream<HostList>,
}

impl Stream for HostWatchStream {
    type Item = HostList;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
