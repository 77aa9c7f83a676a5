//! Transport seam between the host's event delivery and the Reconciler.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::notification::NotificationKind;

/// Handler invoked with the raw payload of one notification.
pub type NotificationHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Opaque handle for one transport registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps a raw handle value (for transport implementations).
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The host's event-delivery mechanism, reduced to what the bridge needs.
///
/// Implementations must deliver notifications of the same kind in emission
/// order (FIFO). No ordering is assumed across kinds or sessions.
pub trait NotificationTransport: Send + Sync {
    /// Registers `handler` for every future notification of `kind`.
    fn subscribe(&self, kind: NotificationKind, handler: NotificationHandler) -> SubscriptionId;

    /// Removes a registration. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

struct Registration {
    id: SubscriptionId,
    kind: NotificationKind,
    handler: NotificationHandler,
}

/// In-process notification bus.
///
/// Delivers synchronously, one notification at a time, to handlers in
/// registration order. A panicking handler is contained and logged so the
/// remaining registrations still receive the notification.
#[derive(Default)]
pub struct LocalNotificationBus {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl LocalNotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` to every handler registered for `kind`.
    pub fn emit(&self, kind: NotificationKind, payload: serde_json::Value) {
        let handlers: Vec<NotificationHandler> = self
            .registrations
            .lock()
            .expect("bus registrations lock poisoned")
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.handler.clone())
            .collect();
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(&payload))).is_err() {
                error!(kind = %kind, "notification handler panicked; continuing delivery");
            }
        }
    }

    /// Delivers by wire name, for hosts that hand names through untyped.
    /// Unknown names are logged and dropped.
    pub fn emit_name(&self, name: &str, payload: serde_json::Value) {
        match NotificationKind::from_str(name) {
            Ok(kind) => self.emit(kind, payload),
            Err(_) => warn!(name, "dropping notification with unknown kind"),
        }
    }

    /// Number of live registrations for `kind`.
    pub fn handler_count(&self, kind: NotificationKind) -> usize {
        self.registrations
            .lock()
            .expect("bus registrations lock poisoned")
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

impl NotificationTransport for LocalNotificationBus {
    fn subscribe(&self, kind: NotificationKind, handler: NotificationHandler) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registrations
            .lock()
            .expect("bus registrations lock poisoned")
            .push(Registration { id, kind, handler });
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registrations
            .lock()
            .expect("bus registrations lock poisoned")
            .retain(|r| r.id != id);
    }
}
