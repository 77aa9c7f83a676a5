//! Per-notification-kind decision logic.
//!
//! The Reconciler translates each inbound notification into store
//! operations, applying the session-scoping and request-correlation rules.
//! Handlers are plain functions over live state: the Active-Session Pointer
//! is read at delivery time, never captured when a handler is registered.
//! A handler that cannot decode its payload logs and drops it; nothing here
//! ever propagates an error outward or prevents delivery to other
//! registrations.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use prism_core::ResultStore;
use prism_core::result::{ErrorCode, ErrorInfo};

use crate::bridge::BridgeSelectors;
use crate::notification::{
    CancelledPayload, ClearPayload, ErrorPayload, LoadingPayload, NotificationKind,
    RestorePayload, SessionCreatedPayload,
};

/// Fallback message for error notifications that carry neither `error` nor
/// `message`.
const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred during analysis";

/// Maps inbound notifications onto [`ResultStore`] operations.
pub struct Reconciler {
    store: Arc<ResultStore>,
    selectors: BridgeSelectors,
}

impl Reconciler {
    /// Creates a reconciler writing into `store`.
    ///
    /// When `selectors` carries a session-id selector, handlers scoped to
    /// the active session reconcile the store's pointer from it before
    /// mutating, so the pointer always reflects what the presentation layer
    /// shows at delivery time.
    pub fn new(store: Arc<ResultStore>, selectors: BridgeSelectors) -> Self {
        Self { store, selectors }
    }

    /// Routes one notification to its handler.
    pub fn dispatch(&self, kind: NotificationKind, payload: &serde_json::Value) {
        debug!(kind = %kind, "notification received");
        match kind {
            NotificationKind::SessionCreated => self.on_session_created(payload),
            NotificationKind::ResultUpdate => self.on_result_update(payload),
            NotificationKind::ResultClear => self.on_result_clear(payload),
            NotificationKind::ResultLoading => self.on_result_loading(payload),
            NotificationKind::Cancelled => self.on_cancelled(payload),
            NotificationKind::ResultRestore => self.on_result_restore(payload),
            // Two wire names, one normalizer
            NotificationKind::ResultError | NotificationKind::ResultErrorLegacy => {
                self.on_result_error(payload)
            }
        }
    }

    /// `analysis-session-created`: point the store at the new session and
    /// show its loading indicator.
    ///
    /// This subscription is mandatory. Without it the pointer stays on the
    /// previous session and every subsequent loading/error notification for
    /// the new session lands on the wrong bucket.
    fn on_session_created(&self, payload: &serde_json::Value) {
        let Some(p) = self.decode::<SessionCreatedPayload>(NotificationKind::SessionCreated, payload)
        else {
            return;
        };
        self.store.switch_session(&p.thread_id);
        let data_source_id = p
            .data_source_id
            .or_else(|| self.selectors.data_source_id.as_ref().and_then(|s| s()));
        self.store.tag_data_source(&p.thread_id, data_source_id);
        self.store.set_loading(true, None);
    }

    /// `analysis-result-update`: apply the batch. No active-session
    /// filtering — the store scopes by `batch.session_id`, so background
    /// sessions keep accumulating while the user views another one.
    fn on_result_update(&self, payload: &serde_json::Value) {
        let Some(batch) = self.decode(NotificationKind::ResultUpdate, payload) else {
            return;
        };
        self.store.update_results(&batch);
    }

    /// `analysis-result-clear`: drop one message's items or the session's.
    fn on_result_clear(&self, payload: &serde_json::Value) {
        let Some(p) = self.decode::<ClearPayload>(NotificationKind::ResultClear, payload) else {
            return;
        };
        self.store.clear_results(&p.session_id, p.message_id.as_deref());
    }

    /// `analysis-result-loading`: forward to the active session.
    fn on_result_loading(&self, payload: &serde_json::Value) {
        let Some(p) = self.decode::<LoadingPayload>(NotificationKind::ResultLoading, payload)
        else {
            return;
        };
        self.sync_active_session();
        self.store.set_loading(p.loading, p.request_id);
    }

    /// `analysis-cancelled`: end whichever request is active for the
    /// currently active session. Unconditional on payload fields beyond
    /// presence — a cancellation must never leave a spinner behind.
    fn on_cancelled(&self, payload: &serde_json::Value) {
        let p: CancelledPayload = serde_json::from_value(payload.clone()).unwrap_or_default();
        if let Some(message) = &p.message {
            debug!(message = %message, "analysis cancelled");
        }
        self.sync_active_session();
        self.store.set_loading(false, None);
    }

    /// `analysis-result-restore`: replay historical items for a message.
    fn on_result_restore(&self, payload: &serde_json::Value) {
        let Some(p) = self.decode::<RestorePayload>(NotificationKind::ResultRestore, payload)
        else {
            return;
        };
        let summary = self.store.restore_results(&p.session_id, &p.message_id, &p.items);
        debug!(
            session_id = %p.session_id,
            message_id = %p.message_id,
            valid = summary.valid_items,
            invalid = summary.invalid_items,
            "restored historical results"
        );
    }

    /// `analysis-result-error` / `analysis-error`: normalize and record on
    /// the active session.
    fn on_result_error(&self, payload: &serde_json::Value) {
        let p: ErrorPayload = serde_json::from_value(payload.clone()).unwrap_or_default();
        self.sync_active_session();
        self.store.set_error_with_info(normalize_error(&p));
    }

    /// Reconciles the store's Active-Session Pointer from the host's
    /// selector, when one was provided. Called by active-session-scoped
    /// handlers at delivery time.
    fn sync_active_session(&self) {
        let Some(selector) = &self.selectors.session_id else {
            return;
        };
        let Some(live) = selector() else {
            return;
        };
        if self.store.active_session_id().as_deref() != Some(live.as_str()) {
            self.store.switch_session(&live);
        }
    }

    fn decode<T: DeserializeOwned>(
        &self,
        kind: NotificationKind,
        payload: &serde_json::Value,
    ) -> Option<T> {
        match serde_json::from_value(payload.clone()) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(kind = %kind, error = %e, "dropping undecodable notification payload");
                None
            }
        }
    }
}

/// Builds an [`ErrorInfo`] from a raw error payload.
///
/// Both error notification kinds share this normalizer:
/// - `code`: parsed from the wire, defaulting to `ANALYSIS_ERROR` when
///   missing or unrecognized
/// - `message`: `error` wins over `message`, then a fallback text
/// - `recoverySuggestions`: defaults to empty
/// - `timestamp`: kept only when positive, else wall clock at handling time
pub fn normalize_error(payload: &ErrorPayload) -> ErrorInfo {
    ErrorInfo {
        code: payload
            .code
            .as_deref()
            .map(ErrorCode::from_wire)
            .unwrap_or_default(),
        message: payload
            .error
            .clone()
            .or_else(|| payload.message.clone())
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        details: payload.details.clone(),
        recovery_suggestions: payload.recovery_suggestions.clone().unwrap_or_default(),
        timestamp: payload
            .timestamp
            .filter(|t| *t > 0)
            .unwrap_or_else(|| Utc::now().timestamp_millis()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconciler() -> (Arc<ResultStore>, Reconciler) {
        let store = Arc::new(ResultStore::new());
        let reconciler = Reconciler::new(store.clone(), BridgeSelectors::default());
        (store, reconciler)
    }

    #[test]
    fn test_session_created_switches_and_loads() {
        let (store, reconciler) = reconciler();
        reconciler.dispatch(
            NotificationKind::SessionCreated,
            &json!({ "threadId": "t1", "dataSourceId": "ds-1" }),
        );

        assert_eq!(store.active_session_id().as_deref(), Some("t1"));
        assert!(store.is_loading("t1"));
        assert_eq!(
            store.get_session_state("t1").data_source_id.as_deref(),
            Some("ds-1")
        );
    }

    #[test]
    fn test_session_created_data_source_falls_back_to_selector() {
        let store = Arc::new(ResultStore::new());
        let selectors = BridgeSelectors::default()
            .with_data_source_id(Arc::new(|| Some("ds-live".to_string())));
        let reconciler = Reconciler::new(store.clone(), selectors);

        reconciler.dispatch(NotificationKind::SessionCreated, &json!({ "threadId": "t1" }));
        assert_eq!(
            store.get_session_state("t1").data_source_id.as_deref(),
            Some("ds-live")
        );
    }

    #[test]
    fn test_update_ignores_active_session() {
        let (store, reconciler) = reconciler();
        store.switch_session("elsewhere");
        reconciler.dispatch(
            NotificationKind::ResultUpdate,
            &json!({
                "sessionId": "t1",
                "messageId": "m1",
                "items": [{ "id": "i1", "type": "metric", "data": 7 }],
                "isComplete": true
            }),
        );

        assert_eq!(store.get_results("t1", "m1").len(), 1);
        assert!(!store.has_data("elsewhere"));
    }

    #[test]
    fn test_cancelled_clears_loading_and_request() {
        let (store, reconciler) = reconciler();
        store.switch_session("t1");
        store.set_loading(true, Some("r1".to_string()));

        reconciler.dispatch(NotificationKind::Cancelled, &json!({ "threadId": "t1" }));

        let state = store.get_session_state("t1");
        assert!(!state.loading);
        assert!(state.active_request_id.is_none());
    }

    #[test]
    fn test_cancelled_tolerates_garbage_payload() {
        let (store, reconciler) = reconciler();
        store.switch_session("t1");
        store.set_loading(true, None);

        reconciler.dispatch(NotificationKind::Cancelled, &json!("not an object"));
        assert!(!store.is_loading("t1"));
    }

    #[test]
    fn test_loading_reads_pointer_at_delivery_time() {
        let store = Arc::new(ResultStore::new());
        // Selector simulating a presentation layer that has moved on to t2
        let selectors =
            BridgeSelectors::default().with_session_id(Arc::new(|| Some("t2".to_string())));
        let reconciler = Reconciler::new(store.clone(), selectors);

        store.switch_session("t1");
        reconciler.dispatch(
            NotificationKind::ResultLoading,
            &json!({ "sessionId": "t2", "loading": true, "requestId": "r9" }),
        );

        assert!(!store.is_loading("t1"));
        assert!(store.is_loading("t2"));
        assert_eq!(store.active_session_id().as_deref(), Some("t2"));
    }

    #[test]
    fn test_clear_routes_message_scope() {
        let (store, reconciler) = reconciler();
        reconciler.dispatch(
            NotificationKind::ResultUpdate,
            &json!({
                "sessionId": "t1",
                "messageId": "m1",
                "items": [{ "id": "i1", "type": "insight", "data": "x" }]
            }),
        );
        reconciler.dispatch(
            NotificationKind::ResultClear,
            &json!({ "sessionId": "t1", "messageId": "m1" }),
        );
        assert!(store.get_results("t1", "m1").is_empty());
    }

    #[test]
    fn test_restore_round_trips_through_dispatch() {
        let (store, reconciler) = reconciler();
        let payload = json!({
            "sessionId": "t1",
            "messageId": "m1",
            "items": [{ "id": "h1", "kind": "table", "payload": { "rows": [] } }]
        });
        reconciler.dispatch(NotificationKind::ResultRestore, &payload);
        reconciler.dispatch(NotificationKind::ResultRestore, &payload);

        assert_eq!(store.get_results("t1", "m1").len(), 1);
    }

    #[test]
    fn test_error_normalization_defaults() {
        let payload: ErrorPayload = serde_json::from_value(json!({})).unwrap();
        let info = normalize_error(&payload);

        assert_eq!(info.code, ErrorCode::AnalysisError);
        assert_eq!(info.message, UNKNOWN_ERROR_MESSAGE);
        assert!(info.recovery_suggestions.is_empty());
        assert!(info.timestamp > 0);
    }

    #[test]
    fn test_error_prefers_error_over_message() {
        let payload: ErrorPayload = serde_json::from_value(json!({
            "error": "python exited with code 1",
            "message": "legacy message",
            "code": "PYTHON_EXECUTION",
            "timestamp": 1700000000000i64
        }))
        .unwrap();
        let info = normalize_error(&payload);

        assert_eq!(info.code, ErrorCode::PythonExecution);
        assert_eq!(info.message, "python exited with code 1");
        assert_eq!(info.timestamp, 1700000000000);
    }

    #[test]
    fn test_error_nonpositive_timestamp_replaced() {
        let payload: ErrorPayload =
            serde_json::from_value(json!({ "message": "m", "timestamp": 0 })).unwrap();
        assert!(normalize_error(&payload).timestamp > 0);
    }

    #[test]
    fn test_both_error_kinds_record_on_active_session() {
        let (store, reconciler) = reconciler();
        store.switch_session("t1");

        reconciler.dispatch(
            NotificationKind::ResultErrorLegacy,
            &json!({ "error": "first", "code": "DATA_NOT_FOUND" }),
        );
        assert_eq!(store.get_error("t1").unwrap().code, ErrorCode::DataNotFound);

        reconciler.dispatch(
            NotificationKind::ResultError,
            &json!({ "message": "second" }),
        );
        assert_eq!(store.get_error("t1").unwrap().message, "second");
    }

    #[test]
    fn test_undecodable_update_is_dropped() {
        let (store, reconciler) = reconciler();
        reconciler.dispatch(NotificationKind::ResultUpdate, &json!({ "messageId": "m1" }));
        assert!(store.session_ids().is_empty());
    }
}
