//! Analysis result domain module.
//!
//! Contains the wire-facing data model for analysis results:
//!
//! - `item`: Single result items (`ResultItem`, `ItemKind`, `Provenance`)
//! - `batch`: Batched result updates (`ResultBatch`)
//! - `error_info`: The error taxonomy (`ErrorCode`, `ErrorInfo`)
//! - `restore`: Summary type for historical restoration (`RestoreSummary`)

mod batch;
mod error_info;
mod item;
mod restore;

// Re-export public API
pub use batch::ResultBatch;
pub use error_info::{ErrorCode, ErrorInfo};
pub use item::{ItemKind, Provenance, ResultItem};
pub use restore::RestoreSummary;
