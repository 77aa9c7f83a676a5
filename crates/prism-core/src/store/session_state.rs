//! Per-session state bucket.

use std::collections::HashMap;

use serde::Serialize;

use crate::result::{ErrorInfo, ResultItem};

/// The item list for one message, plus its completion flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResults {
    /// Items in arrival order.
    pub items: Vec<ResultItem>,
    /// True once a batch marked this message's list as final.
    pub complete: bool,
    /// Store-wide insertion sequence, used for cross-message ordering and
    /// retention eviction.
    #[serde(skip)]
    pub(crate) seq: u64,
}

/// One session's complete synchronized state.
///
/// Buckets are created lazily on first write and persist until an explicit
/// clear; switching the active session never touches them. All accessors on
/// [`crate::store::ResultStore`] hand out clones of this type, never live
/// references.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Stable session identifier.
    pub session_id: String,
    /// Data source the session analyzes, when known.
    pub data_source_id: Option<String>,
    /// Results keyed by message.
    pub items_by_message: HashMap<String, MessageResults>,
    /// True only while a request is in flight for this session.
    pub loading: bool,
    /// Identifier of the in-flight request; `Some` iff `loading`.
    pub active_request_id: Option<String>,
    /// Most recent error, replaced wholesale on each error notification.
    pub error: Option<ErrorInfo>,
    /// The user's current focus within the session. A selection may precede
    /// arrival of its items, so this is never validated against
    /// `items_by_message`.
    pub selected_message_id: Option<String>,
}

impl SessionState {
    /// Creates an empty bucket for `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            data_source_id: None,
            items_by_message: HashMap::new(),
            loading: false,
            active_request_id: None,
            error: None,
            selected_message_id: None,
        }
    }

    /// Items for one message, in arrival order.
    pub fn results_for(&self, message_id: &str) -> &[ResultItem] {
        self.items_by_message
            .get(message_id)
            .map(|m| m.items.as_slice())
            .unwrap_or(&[])
    }

    /// True once a batch marked the message's item list as final.
    pub fn is_complete(&self, message_id: &str) -> bool {
        self.items_by_message
            .get(message_id)
            .map(|m| m.complete)
            .unwrap_or(false)
    }

    /// True if any message holds at least one item.
    pub fn has_data(&self) -> bool {
        self.items_by_message.values().any(|m| !m.items.is_empty())
    }

    /// All items across messages, ordered by message insertion then arrival.
    pub fn all_items(&self) -> Vec<ResultItem> {
        let mut messages: Vec<&MessageResults> = self.items_by_message.values().collect();
        messages.sort_by_key(|m| m.seq);
        messages.iter().flat_map(|m| m.items.iter().cloned()).collect()
    }
}
