//! The result store: session buckets plus the Active-Session Pointer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::result::{ErrorInfo, RestoreSummary, ResultBatch, ResultItem, Provenance};
use super::observer::{ObserverFn, ObserverRegistry, StoreChange, StoreEvent, Subscription};
use super::session_state::{MessageResults, SessionState};

/// Tuning knobs for a [`ResultStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on message entries retained per session. When a new
    /// message entry would exceed the bound, the oldest entry (by insertion
    /// sequence) is evicted. The backend has no notion of unbounded
    /// sessions, so the default is generous.
    pub max_messages_per_session: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_messages_per_session: 256,
        }
    }
}

/// Owns the mapping from session identifier to [`SessionState`] and the
/// Active-Session Pointer.
///
/// The store is explicitly constructed and shared by `Arc` between the
/// Reconciler and the presentation layer; there is no process-wide
/// singleton. All mutating operations notify subscribed observers
/// synchronously with a snapshot of the affected bucket, and all read
/// accessors return defensive clones.
///
/// # Scoping rules
///
/// - `set_loading` and `set_error_with_info` are scoped to the *currently
///   active* session at call time.
/// - `update_results` is scoped to `batch.session_id`, never to the active
///   session: background sessions keep accumulating results while the user
///   views another session.
///
/// # Thread Safety
///
/// Interior mutability via `std::sync::RwLock`; observers are invoked after
/// internal locks are released.
pub struct ResultStore {
    /// Session buckets, created lazily on first write.
    sessions: RwLock<HashMap<String, SessionState>>,
    /// Identifier of the session currently presented to the user.
    active_session: RwLock<Option<String>>,
    /// Listener registry for mutation events.
    observers: Arc<ObserverRegistry>,
    /// Monotonic counter for message-entry insertion order.
    next_seq: AtomicU64,
    config: StoreConfig,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultStore {
    /// Creates an empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            active_session: RwLock::new(None),
            observers: Arc::new(ObserverRegistry::new()),
            next_seq: AtomicU64::new(1),
            config,
        }
    }

    // ========================================================================
    // Active-Session Pointer
    // ========================================================================

    /// Points the store at `session_id`.
    ///
    /// Side effect only on the pointer: no bucket is created, deleted, or
    /// mutated, and no bucket's loading/error state is touched.
    pub fn switch_session(&self, session_id: &str) {
        {
            let mut active = self
                .active_session
                .write()
                .expect("active session lock poisoned");
            *active = Some(session_id.to_string());
        }
        debug!(session_id, "switched active session");
        self.notify(StoreChange::SessionSwitched, session_id);
    }

    /// The identifier of the currently active session, if any.
    pub fn active_session_id(&self) -> Option<String> {
        self.active_session
            .read()
            .expect("active session lock poisoned")
            .clone()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Sets the loading state of the currently active session.
    ///
    /// Setting `true` stores `request_id` (or a generated token when absent)
    /// as the session's active request. Setting `false` clears the active
    /// request regardless of which request last set it: any terminating
    /// signal for the active session ends its loading state, so a cancelled
    /// request can never leave an orphaned spinner behind.
    ///
    /// A call with no active session is logged and dropped.
    pub fn set_loading(&self, loading: bool, request_id: Option<String>) {
        let Some(session_id) = self.active_session_id() else {
            warn!(loading, "set_loading with no active session; dropping");
            return;
        };
        self.mutate_session(&session_id, StoreChange::Loading, |state| {
            if loading {
                state.loading = true;
                state.active_request_id =
                    Some(request_id.unwrap_or_else(generate_request_token));
            } else {
                state.loading = false;
                state.active_request_id = None;
            }
        });
    }

    /// Applies a result batch to the bucket named by `batch.session_id`.
    ///
    /// Items are appended to the message's list in arrival order;
    /// `is_complete` marks the list as final and stays set once seen.
    pub fn update_results(&self, batch: &ResultBatch) {
        debug!(
            session_id = %batch.session_id,
            message_id = %batch.message_id,
            items = batch.items.len(),
            is_complete = batch.is_complete,
            "applying result batch"
        );
        self.mutate_session(&batch.session_id, StoreChange::Results, |state| {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let entry = state
                .items_by_message
                .entry(batch.message_id.clone())
                .or_insert_with(|| MessageResults {
                    items: Vec::new(),
                    complete: false,
                    seq,
                });
            entry.items.extend(batch.items.iter().cloned());
            if batch.is_complete {
                entry.complete = true;
            }
            self.evict_over_cap(state);
        });
    }

    /// Removes one message's items, or all items for the session when
    /// `message_id` is `None`.
    ///
    /// Loading, error, and selection state are untouched. Clearing an
    /// unknown session is a no-op.
    pub fn clear_results(&self, session_id: &str, message_id: Option<&str>) {
        let exists = self
            .sessions
            .read()
            .expect("sessions lock poisoned")
            .contains_key(session_id);
        if !exists {
            debug!(session_id, "clear_results for unknown session; nothing to do");
            return;
        }
        self.mutate_session(session_id, StoreChange::Cleared, |state| match message_id {
            Some(message_id) => {
                state.items_by_message.remove(message_id);
            }
            None => {
                state.items_by_message.clear();
            }
        });
    }

    /// Idempotently installs a historical item list for a message.
    ///
    /// The message's list is replaced, not appended to, so repeated
    /// restoration (e.g. on re-render) is a no-op after the first call.
    /// Raw items failing shape validation are dropped and counted in the
    /// returned summary, never raised. Restored items default to
    /// [`Provenance::Restored`] when the wire value carries none.
    pub fn restore_results(
        &self,
        session_id: &str,
        message_id: &str,
        items: &[serde_json::Value],
    ) -> RestoreSummary {
        let mut summary = RestoreSummary {
            total_items: items.len(),
            ..Default::default()
        };
        let mut valid: Vec<ResultItem> = Vec::with_capacity(items.len());

        for (index, raw) in items.iter().enumerate() {
            match decode_restored_item(raw, session_id, message_id) {
                Ok(item) => valid.push(item),
                Err(reason) => {
                    summary.invalid_items += 1;
                    summary.errors.push(format!("item {index}: {reason}"));
                }
            }
        }
        summary.valid_items = valid.len();

        if !summary.is_clean() {
            warn!(
                session_id,
                message_id,
                invalid = summary.invalid_items,
                "dropped invalid items during restore"
            );
        }

        self.mutate_session(session_id, StoreChange::Restored, |state| {
            // Preserve the entry's insertion sequence across repeated
            // restores so the bucket is byte-for-byte identical afterwards.
            let seq = state
                .items_by_message
                .get(message_id)
                .map(|m| m.seq)
                .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::Relaxed));
            state.items_by_message.insert(
                message_id.to_string(),
                MessageResults {
                    items: valid,
                    complete: true,
                    seq,
                },
            );
            self.evict_over_cap(state);
        });

        summary
    }

    /// Replaces the currently active session's error.
    ///
    /// A call with no active session is logged and dropped.
    pub fn set_error_with_info(&self, info: ErrorInfo) {
        let Some(session_id) = self.active_session_id() else {
            warn!(code = %info.code, "set_error_with_info with no active session; dropping");
            return;
        };
        self.mutate_session(&session_id, StoreChange::Error, |state| {
            state.error = Some(info);
        });
    }

    /// Records the user's current focus within `session_id`.
    ///
    /// Pure bookkeeping: the selection is not validated against existing
    /// items, since a selection may precede arrival of its items.
    pub fn select_message(&self, session_id: &str, message_id: &str) {
        self.mutate_session(session_id, StoreChange::Selection, |state| {
            state.selected_message_id = Some(message_id.to_string());
        });
    }

    /// Records which data source `session_id` analyzes.
    ///
    /// Silent bookkeeping: observers learn about it with the next mutation
    /// event for the session.
    pub fn tag_data_source(&self, session_id: &str, data_source_id: Option<String>) {
        let Some(data_source_id) = data_source_id else {
            return;
        };
        let mut sessions = self.sessions.write().expect("sessions lock poisoned");
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionState::new(session_id))
            .data_source_id = Some(data_source_id);
    }

    /// Drops every bucket and clears the Active-Session Pointer.
    pub fn reset(&self) {
        {
            let mut sessions = self.sessions.write().expect("sessions lock poisoned");
            sessions.clear();
        }
        {
            let mut active = self
                .active_session
                .write()
                .expect("active session lock poisoned");
            *active = None;
        }
        self.observers.notify(&StoreEvent {
            change: StoreChange::Reset,
            session_id: None,
            state: None,
        });
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Registers an observer invoked synchronously after every mutation,
    /// with a snapshot of the affected state.
    pub fn subscribe(&self, observer: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Subscription {
        let observer: ObserverFn = Arc::new(observer);
        let id = self.observers.add(observer);
        Subscription::new(Arc::downgrade(&self.observers), id)
    }

    // ========================================================================
    // Read accessors (defensive snapshots)
    // ========================================================================

    /// Snapshot of one session's bucket; an empty default for unknown
    /// sessions, never an error.
    pub fn get_session_state(&self, session_id: &str) -> SessionState {
        self.sessions
            .read()
            .expect("sessions lock poisoned")
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| SessionState::new(session_id))
    }

    /// Items for one message of one session, in arrival order.
    pub fn get_results(&self, session_id: &str, message_id: &str) -> Vec<ResultItem> {
        self.get_session_state(session_id)
            .results_for(message_id)
            .to_vec()
    }

    /// All items of the currently active session, ordered by message
    /// insertion then arrival. Empty when no session is active.
    pub fn get_current_results(&self) -> Vec<ResultItem> {
        match self.active_session_id() {
            Some(session_id) => self.get_session_state(&session_id).all_items(),
            None => Vec::new(),
        }
    }

    /// True if the session holds at least one item.
    pub fn has_data(&self, session_id: &str) -> bool {
        self.get_session_state(session_id).has_data()
    }

    /// The session's loading flag.
    pub fn is_loading(&self, session_id: &str) -> bool {
        self.get_session_state(session_id).loading
    }

    /// True once a batch marked the message's item list as final.
    pub fn is_complete(&self, session_id: &str, message_id: &str) -> bool {
        self.get_session_state(session_id).is_complete(message_id)
    }

    /// The session's current error, if any.
    pub fn get_error(&self, session_id: &str) -> Option<ErrorInfo> {
        self.get_session_state(session_id).error
    }

    /// The session's selected message, if any.
    pub fn selected_message_id(&self, session_id: &str) -> Option<String> {
        self.get_session_state(session_id).selected_message_id
    }

    /// Identifiers of every session with a bucket.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .read()
            .expect("sessions lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Applies `mutate` to the session's bucket (created lazily), then
    /// notifies observers with a snapshot taken after the mutation. The
    /// write lock is released before observers run.
    fn mutate_session(
        &self,
        session_id: &str,
        change: StoreChange,
        mutate: impl FnOnce(&mut SessionState),
    ) {
        let snapshot = {
            let mut sessions = self.sessions.write().expect("sessions lock poisoned");
            let state = sessions
                .entry(session_id.to_string())
                .or_insert_with(|| SessionState::new(session_id));
            mutate(state);
            state.clone()
        };
        self.observers.notify(&StoreEvent {
            change,
            session_id: Some(session_id.to_string()),
            state: Some(snapshot),
        });
    }

    /// Notifies observers of a pointer move with a snapshot of the target
    /// session (default view when no bucket exists yet).
    fn notify(&self, change: StoreChange, session_id: &str) {
        let snapshot = self.get_session_state(session_id);
        self.observers.notify(&StoreEvent {
            change,
            session_id: Some(session_id.to_string()),
            state: Some(snapshot),
        });
    }

    /// Evicts oldest message entries until the session is within the
    /// retention cap.
    fn evict_over_cap(&self, state: &mut SessionState) {
        let cap = self.config.max_messages_per_session.max(1);
        while state.items_by_message.len() > cap {
            let oldest = state
                .items_by_message
                .iter()
                .min_by_key(|(_, m)| m.seq)
                .map(|(message_id, _)| message_id.clone());
            match oldest {
                Some(message_id) => {
                    debug!(
                        session_id = %state.session_id,
                        message_id = %message_id,
                        "evicting oldest message entry over retention cap"
                    );
                    state.items_by_message.remove(&message_id);
                }
                None => break,
            }
        }
    }
}

/// Generates a request token for loading transitions that arrive without a
/// request identifier.
fn generate_request_token() -> String {
    format!("req-{}", Uuid::new_v4())
}

/// Decodes and validates one raw restored item.
///
/// Fills in session/message identifiers and defaults the provenance to
/// `restored` when the wire value carries none (including the legacy
/// `source` spelling).
fn decode_restored_item(
    raw: &serde_json::Value,
    session_id: &str,
    message_id: &str,
) -> Result<ResultItem, String> {
    let mut item: ResultItem =
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    item.validate().map_err(|e| e.to_string())?;
    if raw.get("provenance").is_none() && raw.get("source").is_none() {
        item.provenance = Provenance::Restored;
    }
    if item.session_id.is_none() {
        item.session_id = Some(session_id.to_string());
    }
    if item.message_id.is_none() {
        item.message_id = Some(message_id.to_string());
    }
    Ok(item)
}
