//! Restoration summary type.

use serde::{Deserialize, Serialize};

/// Per-call summary returned by
/// [`crate::store::ResultStore::restore_results`].
///
/// Items that fail shape validation are dropped and counted here, never
/// raised to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    /// Number of items offered for restoration.
    pub total_items: usize,
    /// Number of items that passed validation and were installed.
    pub valid_items: usize,
    /// Number of items dropped.
    pub invalid_items: usize,
    /// One description per dropped item.
    pub errors: Vec<String>,
}

impl RestoreSummary {
    /// True when every offered item was installed.
    pub fn is_clean(&self) -> bool {
        self.invalid_items == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_clean() {
        let mut summary = RestoreSummary {
            total_items: 2,
            valid_items: 2,
            ..Default::default()
        };
        assert!(summary.is_clean());

        summary.invalid_items = 1;
        summary.errors.push("item 'x' has null payload".to_string());
        assert!(!summary.is_clean());
    }
}
