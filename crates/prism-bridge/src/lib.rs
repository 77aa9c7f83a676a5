//! Notification ingress for Prism's analysis result synchronization.
//!
//! This crate connects the host's event-delivery mechanism to the
//! [`prism_core::ResultStore`]:
//!
//! - `notification`: Wire notification kinds and payload shapes
//! - `transport`: The transport seam (`NotificationTransport`) and an
//!   in-process FIFO bus (`LocalNotificationBus`)
//! - `reconciler`: Per-notification-kind decision logic mapping inbound
//!   notifications onto store operations
//! - `bridge`: Lifecycle entry point (`ResultBridge`) with idempotent
//!   initialize/teardown
//!
//! The presentation layer consumes the store directly; nothing here is
//! meant to be called from UI components except the bridge lifecycle.

pub mod bridge;
pub mod notification;
pub mod reconciler;
pub mod transport;

// Re-export public API
pub use bridge::{BridgeSelectors, IdSelector, ResultBridge};
pub use notification::{
    CancelledPayload, ClearPayload, ErrorPayload, LoadingPayload, NotificationKind,
    RestorePayload, SessionCreatedPayload,
};
pub use reconciler::{Reconciler, normalize_error};
pub use transport::{LocalNotificationBus, NotificationHandler, NotificationTransport, SubscriptionId};
