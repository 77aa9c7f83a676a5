//! Bridge lifecycle: idempotent subscription management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use strum::IntoEnumIterator;
use tracing::debug;

use prism_core::ResultStore;

use crate::notification::NotificationKind;
use crate::reconciler::Reconciler;
use crate::transport::{NotificationHandler, NotificationTransport, SubscriptionId};

/// Accessor for an identifier owned by the presentation layer, queried at
/// delivery time.
///
/// Selectors exist to kill the stale-pointer hazard: a handler must never
/// close over "the current session" as a value captured when it was
/// registered. Passing an accessor instead of a snapshot makes the capture
/// impossible.
pub type IdSelector = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Live accessors handed to the bridge by the host application.
#[derive(Clone, Default)]
pub struct BridgeSelectors {
    /// The session the presentation layer currently shows.
    pub session_id: Option<IdSelector>,
    /// The data source the presentation layer currently targets, used when
    /// a session-created notification omits its own.
    pub data_source_id: Option<IdSelector>,
}

impl BridgeSelectors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, selector: IdSelector) -> Self {
        self.session_id = Some(selector);
        self
    }

    pub fn with_data_source_id(mut self, selector: IdSelector) -> Self {
        self.data_source_id = Some(selector);
        self
    }
}

/// Connects a transport to a [`ResultStore`] through a [`Reconciler`].
///
/// The bridge is explicitly constructed and owns its lifecycle: call
/// [`ResultBridge::initialize`] once at application start and
/// [`ResultBridge::teardown`] at full teardown or between tests. Multiple
/// independent bridges (each with their own store and transport) are safe.
pub struct ResultBridge {
    transport: Arc<dyn NotificationTransport>,
    reconciler: Arc<Reconciler>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    initialized: AtomicBool,
}

impl ResultBridge {
    /// Creates a bridge between `transport` and `store`.
    pub fn new(
        store: Arc<ResultStore>,
        transport: Arc<dyn NotificationTransport>,
        selectors: BridgeSelectors,
    ) -> Self {
        Self {
            transport,
            reconciler: Arc::new(Reconciler::new(store, selectors)),
            subscriptions: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
        }
    }

    /// Registers exactly one handler per notification kind.
    ///
    /// Idempotent: a second call before [`ResultBridge::teardown`] performs
    /// no additional subscriptions.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("bridge already initialized; skipping");
            return;
        }
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("bridge subscriptions lock poisoned");
        for kind in NotificationKind::iter() {
            let reconciler = self.reconciler.clone();
            let handler: NotificationHandler =
                Arc::new(move |payload| reconciler.dispatch(kind, payload));
            subscriptions.push(self.transport.subscribe(kind, handler));
        }
        debug!(count = subscriptions.len(), "bridge subscriptions registered");
    }

    /// Unsubscribes every handler and clears the initialized flag, enabling
    /// clean re-initialization.
    pub fn teardown(&self) {
        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .lock()
            .expect("bridge subscriptions lock poisoned")
            .drain(..)
            .collect();
        for id in ids {
            self.transport.unsubscribe(id);
        }
        self.initialized.store(false, Ordering::SeqCst);
        debug!("bridge torn down");
    }

    /// True between a successful `initialize` and the next `teardown`.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

impl Drop for ResultBridge {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.teardown();
        }
    }
}
