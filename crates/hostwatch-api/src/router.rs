//! Event-name keyed listener registry.
//!
//! [`EventRouter`] maps an event type (`"message"`, `"status_update"`, ...)
//! to an ordered list of listeners. Dispatch runs over a copy of the list
//! taken at emit time, so listeners may register or remove listeners
//! (including themselves) without affecting the pass in progress.
//!
//! Each listener invocation is isolated: an `Err` return or a panic is
//! logged and the remaining listeners still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{trace, warn};

/// Outcome of a single listener invocation.
pub type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Listener<T> = Arc<dyn Fn(&T) -> ListenerResult + Send + Sync>;

/// Handle returned by [`EventRouter::on`], used to unregister.
///
/// Registering the same closure twice yields two distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Demultiplexes payloads by event type to registered listeners.
pub struct EventRouter<T> {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener<T>)>>>,
    next_id: AtomicU64,
}

impl<T> EventRouter<T> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `listener` for `event`. Listeners run in registration order.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&T) -> ListenerResult + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let event = event.into();
        trace!(event = %event, listener = id.0, "listener registered");
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered for `event`.
    ///
    /// A dispatch already in progress still reaches the removed listener.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = listeners.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Deliver `payload` to every listener of `event`.
    ///
    /// Returns how many listeners completed successfully.
    pub fn emit(&self, event: &str, payload: &T) -> usize {
        // Copy the list and release the lock before invoking anything, so
        // listeners can call `on`/`off` without deadlocking.
        let snapshot: Vec<(ListenerId, Listener<T>)> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            match listeners.get(event) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(event, listener = id.0, error = %e, "listener failed");
                }
                Err(_) => {
                    warn!(event, listener = id.0, "listener panicked");
                }
            }
        }
        delivered
    }
}

impl<T> Default for EventRouter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventRouter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(event, list)| (event.as_str(), list.len()))
            .collect();
        f.debug_struct("EventRouter")
            .field("listeners", &counts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn listeners_run_in_registration_order() {
        let router = EventRouter::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            router.on("tick", move |n: &u32| {
                log.lock().unwrap().push(format!("{name}:{n}"));
                Ok(())
            });
        }

        assert_eq!(router.emit("tick", &7), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:7", "second:7", "third:7"]
        );
    }

    #[test]
    fn same_closure_registered_twice_runs_twice() {
        let router = EventRouter::<()>::new();
        let hits = Arc::new(AtomicU64::new(0));
        let listener = {
            let hits = Arc::clone(&hits);
            move |(): &()| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        };

        let a = router.on("ping", listener.clone());
        let b = router.on("ping", listener);
        assert_ne!(a, b);

        router.emit("ping", &());
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        assert!(router.off("ping", a));
        router.emit("ping", &());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_listener_does_not_block_the_rest() {
        let router = EventRouter::<()>::new();
        let hits = Arc::new(AtomicU64::new(0));

        router.on("evt", |(): &()| Err("boom".into()));
        router.on("evt", |(): &()| panic!("listener bug"));
        {
            let hits = Arc::clone(&hits);
            router.on("evt", move |(): &()| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(router.emit("evt", &()), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_during_dispatch_applies_next_pass() {
        let router = Arc::new(EventRouter::<()>::new());
        let hits = Arc::new(AtomicU64::new(0));
        let victim: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        {
            let router_ref = Arc::downgrade(&router);
            let victim = Arc::clone(&victim);
            router.on("evt", move |(): &()| {
                if let (Some(router), Some(id)) = (router_ref.upgrade(), *victim.lock().unwrap()) {
                    router.off("evt", id);
                }
                Ok(())
            });
        }
        let id = {
            let hits = Arc::clone(&hits);
            router.on("evt", move |(): &()| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        *victim.lock().unwrap() = Some(id);

        // First pass still reaches the listener removed mid-dispatch.
        router.emit("evt", &());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        router.emit("evt", &());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(router.listener_count("evt"), 1);
    }

    #[test]
    fn emit_without_listeners_is_a_noop() {
        let router = EventRouter::<()>::new();
        assert_eq!(router.emit("nobody", &()), 0);
        assert!(!router.off("nobody", ListenerId(42)));
    }
}
