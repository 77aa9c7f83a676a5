//! Batched result updates.

use serde::{Deserialize, Serialize};

use super::item::ResultItem;

/// A batch of analysis result items for one message of one session.
///
/// This is the inbound shape of the `analysis-result-update` notification.
/// The backend aggregates individual items into batches; a message may be
/// spread over several batches, the last of which carries
/// `isComplete: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBatch {
    /// Session the batch belongs to. Scoping key for the store; the
    /// Active-Session Pointer plays no part in routing a batch.
    pub session_id: String,
    /// Message the items attach to.
    pub message_id: String,
    /// Correlates the batch with the request that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Items in producer order.
    #[serde(default)]
    pub items: Vec<ResultItem>,
    /// Marks the message's item list as final.
    #[serde(default)]
    pub is_complete: bool,
    /// Emission timestamp (Unix milliseconds).
    #[serde(default)]
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_wire_batch() {
        let batch: ResultBatch = serde_json::from_value(json!({
            "sessionId": "t1",
            "messageId": "m1",
            "requestId": "r1",
            "items": [
                { "id": "i1", "type": "metric", "data": 42 }
            ],
            "isComplete": true,
            "timestamp": 1700000000000i64
        }))
        .unwrap();
        assert_eq!(batch.session_id, "t1");
        assert_eq!(batch.items.len(), 1);
        assert!(batch.is_complete);
    }

    #[test]
    fn test_optional_fields_default() {
        let batch: ResultBatch = serde_json::from_value(json!({
            "sessionId": "t1",
            "messageId": "m1"
        }))
        .unwrap();
        assert!(batch.request_id.is_none());
        assert!(batch.items.is_empty());
        assert!(!batch.is_complete);
        assert_eq!(batch.timestamp, 0);
    }
}
