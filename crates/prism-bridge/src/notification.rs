//! Wire notification kinds and payload shapes.
//!
//! This is the inbound contract with the backend analysis process. Kind
//! names and payload fields must match the emitter exactly, including the
//! legacy/current duplicate naming for error notifications.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The notification kinds the backend emits.
///
/// `ResultError` and `ResultErrorLegacy` are duplicates on the wire; both
/// feed the same normalizer. Subscribing to `SessionCreated` is mandatory:
/// without it the Active-Session Pointer goes stale and loading/error
/// notifications for a new session land on the previous one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum NotificationKind {
    /// A new analysis session (thread) was created.
    #[strum(serialize = "analysis-session-created")]
    SessionCreated,
    /// A batch of result items for one message.
    #[strum(serialize = "analysis-result-update")]
    ResultUpdate,
    /// Items were cleared for a message or a whole session.
    #[strum(serialize = "analysis-result-clear")]
    ResultClear,
    /// Loading state changed.
    #[strum(serialize = "analysis-result-loading")]
    ResultLoading,
    /// The in-flight request was cancelled.
    #[strum(serialize = "analysis-cancelled")]
    Cancelled,
    /// Historical items should be replayed into a session.
    #[strum(serialize = "analysis-result-restore")]
    ResultRestore,
    /// Analysis failed.
    #[strum(serialize = "analysis-result-error")]
    ResultError,
    /// Older backends emit this name for the same error payload.
    #[strum(serialize = "analysis-error")]
    ResultErrorLegacy,
}

impl NotificationKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Payload of `analysis-session-created`.
///
/// `dataSourceName` and `title` travel on the wire for display purposes but
/// play no part in reconciliation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedPayload {
    /// Identifier of the newly created session.
    pub thread_id: String,
    /// Data source the session analyzes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Payload of `analysis-result-loading`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingPayload {
    /// Emitting session; informational — loading is scoped to the active
    /// session at delivery time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Payload of `analysis-result-clear`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearPayload {
    pub session_id: String,
    /// Clear one message's items, or everything for the session when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Payload of `analysis-cancelled`.
///
/// Handling is unconditional on fields beyond presence; whatever request is
/// active for the currently active session ends.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of `analysis-result-restore`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePayload {
    pub session_id: String,
    pub message_id: String,
    /// Raw items; shape validation happens in the store, which drops and
    /// counts invalid entries.
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// Payload of `analysis-result-error` / `analysis-error`.
///
/// Backends disagree on whether the message travels as `error` or
/// `message`, and older ones omit `code`, `recoverySuggestions`, and
/// `timestamp` entirely; see [`crate::reconciler::normalize_error`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_wire_names() {
        assert_eq!(NotificationKind::SessionCreated.as_str(), "analysis-session-created");
        assert_eq!(NotificationKind::ResultUpdate.as_str(), "analysis-result-update");
        assert_eq!(NotificationKind::ResultError.as_str(), "analysis-result-error");
        assert_eq!(NotificationKind::ResultErrorLegacy.as_str(), "analysis-error");
    }

    #[test]
    fn test_kind_parses_from_wire_name() {
        for kind in NotificationKind::iter() {
            assert_eq!(NotificationKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(NotificationKind::from_str("analysis-unknown").is_err());
    }

    #[test]
    fn test_all_kinds_enumerated() {
        // One subscription per kind; both error spellings included.
        assert_eq!(NotificationKind::iter().count(), 8);
    }

    #[test]
    fn test_session_created_payload_decodes_emitter_shape() {
        let payload: SessionCreatedPayload = serde_json::from_value(json!({
            "threadId": "t1",
            "dataSourceId": "ds-1",
            "dataSourceName": "Sales DB",
            "title": "Q3 revenue"
        }))
        .unwrap();
        assert_eq!(payload.thread_id, "t1");
        assert_eq!(payload.data_source_id.as_deref(), Some("ds-1"));
    }

    #[test]
    fn test_error_payload_all_fields_optional() {
        let payload: ErrorPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.code.is_none());
        assert!(payload.error.is_none());
        assert!(payload.timestamp.is_none());
    }
}
