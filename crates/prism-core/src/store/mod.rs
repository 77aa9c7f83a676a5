//! Result store module.
//!
//! This module contains the per-session state buckets and the store that
//! owns them:
//!
//! - `session_state`: One session's view (`SessionState`, `MessageResults`)
//! - `observer`: Listener registry and subscription handles
//! - `result_store`: The store itself (`ResultStore`, `StoreConfig`)

mod observer;
mod result_store;
mod session_state;

// Re-export public API
pub use observer::{StoreChange, StoreEvent, Subscription};
pub use result_store::{ResultStore, StoreConfig};
pub use session_state::{MessageResults, SessionState};
