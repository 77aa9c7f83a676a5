//! Listener registry for store mutations.
//!
//! Implemented as an explicit list of callback handles with add/remove
//! operations. Subscribing returns a [`Subscription`] capability; there is
//! no implicit framework reactivity anywhere in this layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::session_state::SessionState;

/// Which store operation produced a [`StoreEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    /// The Active-Session Pointer moved.
    SessionSwitched,
    /// A session's loading flag changed.
    Loading,
    /// A result batch was applied.
    Results,
    /// Items were cleared for a message or a whole session.
    Cleared,
    /// Historical items were restored.
    Restored,
    /// A session's error was replaced.
    Error,
    /// The selected message changed.
    Selection,
    /// The whole store was reset.
    Reset,
}

/// Snapshot of affected state, delivered synchronously after each mutation.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    /// The operation that ran.
    pub change: StoreChange,
    /// Session the mutation was scoped to; `None` for a full reset.
    pub session_id: Option<String>,
    /// Clone of the affected session's bucket after the mutation; `None`
    /// for a full reset.
    pub state: Option<SessionState>,
}

/// Observer callback type.
pub type ObserverFn = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Registry of observers keyed by a monotonically increasing handle.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Mutex<Vec<(u64, ObserverFn)>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: ObserverFn) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .expect("observer registry lock poisoned")
            .push((id, observer));
        id
    }

    pub(crate) fn remove(&self, id: u64) {
        self.observers
            .lock()
            .expect("observer registry lock poisoned")
            .retain(|(observer_id, _)| *observer_id != id);
    }

    /// Invokes every registered observer with `event`.
    ///
    /// The list is cloned out of the lock first, so an observer may
    /// unsubscribe (itself or others) from within its callback.
    pub(crate) fn notify(&self, event: &StoreEvent) {
        let observers: Vec<ObserverFn> = self
            .observers
            .lock()
            .expect("observer registry lock poisoned")
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(event);
        }
    }
}

/// Capability to remove an observer from the registry.
///
/// Dropping a `Subscription` without calling [`Subscription::unsubscribe`]
/// leaves the observer registered for the lifetime of the store.
pub struct Subscription {
    registry: Weak<ObserverRegistry>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<ObserverRegistry>, id: u64) -> Self {
        Self { registry, id }
    }

    /// Removes the observer. Safe to call after the store is gone.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn event() -> StoreEvent {
        StoreEvent {
            change: StoreChange::Loading,
            session_id: Some("t1".to_string()),
            state: Some(SessionState::new("t1")),
        }
    }

    #[test]
    fn test_notify_reaches_all_observers() {
        let registry = Arc::new(ObserverRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            registry.add(Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        registry.notify(&event());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_removes_observer() {
        let registry = Arc::new(ObserverRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        let id = registry.add(Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let subscription = Subscription::new(Arc::downgrade(&registry), id);
        subscription.unsubscribe();

        registry.notify(&event());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped_is_noop() {
        let registry = Arc::new(ObserverRegistry::new());
        let id = registry.add(Arc::new(|_| {}));
        let subscription = Subscription::new(Arc::downgrade(&registry), id);
        drop(registry);
        subscription.unsubscribe();
    }
}
