//! Core domain for Prism's analysis result synchronization.
//!
//! This crate owns the per-session view of analysis results: the data model
//! for result items and errors, the [`store::ResultStore`] that reconciled
//! notifications are written into, and the observer registry through which
//! the presentation layer learns about mutations.
//!
//! It has no knowledge of the notification transport; that lives in
//! `prism-bridge`.

pub mod error;
pub mod result;
pub mod store;

// Re-export common error type
pub use error::PrismError;
pub use result::{ErrorCode, ErrorInfo, ItemKind, Provenance, RestoreSummary, ResultBatch, ResultItem};
pub use store::{ResultStore, SessionState, StoreChange, StoreConfig, StoreEvent, Subscription};
