//! Single analysis result items.

use serde::{Deserialize, Serialize};

use crate::error::{PrismError, Result};

/// The kind of content a result item carries.
///
/// `Chart` accepts the legacy wire spelling `echarts`, which older backends
/// still emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[serde(alias = "echarts")]
    Chart,
    Image,
    Table,
    Csv,
    Metric,
    Insight,
    File,
}

/// Where a result item came from.
///
/// `Live` accepts the legacy wire spelling `realtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Produced by an in-flight analysis.
    #[default]
    #[serde(alias = "realtime")]
    Live,
    /// Produced by an analysis that has since completed.
    Completed,
    /// Served from a cache.
    Cached,
    /// Re-populated from historical data.
    Restored,
}

/// A single analysis result item.
///
/// Items are immutable once created; the store only ever appends or replaces
/// whole per-message lists of them.
///
/// `sessionId`, `messageId` and `timestamp` are optional on individual items
/// because the enclosing [`super::ResultBatch`] carries them; they are
/// populated when items travel alone (e.g. during restoration).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    /// Unique item identifier.
    pub id: String,
    /// Content kind. Accepts the legacy field name `type`.
    #[serde(rename = "kind", alias = "type")]
    pub kind: ItemKind,
    /// Kind-specific content. Accepts the legacy field name `data`.
    #[serde(default, alias = "data")]
    pub payload: serde_json::Value,
    /// Free-form metadata attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Session the item belongs to, if carried on the item itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Message the item belongs to, if carried on the item itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Production timestamp (Unix milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Where the item came from. Accepts the legacy field name `source`.
    #[serde(default, alias = "source")]
    pub provenance: Provenance,
}

impl ResultItem {
    /// Validates the item's shape.
    ///
    /// An item must have a non-empty `id` and a non-null `payload`.
    /// Kind validity is already enforced by the type system at decode time.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::InvalidItem`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(PrismError::invalid_item("id is empty"));
        }
        if self.payload.is_null() {
            return Err(PrismError::invalid_item(format!(
                "item '{}' has null payload",
                self.id
            )));
        }
        Ok(())
    }
}
