//! Error types for the Prism synchronization layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the synchronization layer.
///
/// This provides typed, structured error variants with constructor helpers.
/// Note that the Reconciler never propagates these outward: malformed
/// notifications are logged and dropped, and item validation failures are
/// folded into a [`crate::result::RestoreSummary`].
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum PrismError {
    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", etc.
        message: String,
    },

    /// A result item failed shape validation
    #[error("Invalid result item: {0}")]
    InvalidItem(String),

    /// Transport subscription error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrismError {
    /// Creates a Serialization error.
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidItem error.
    pub fn invalid_item(message: impl Into<String>) -> Self {
        Self::InvalidItem(message.into())
    }

    /// Creates a Transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a serialization error.
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is an invalid item error.
    pub fn is_invalid_item(&self) -> bool {
        matches!(self, Self::InvalidItem(_))
    }
}

impl From<serde_json::Error> for PrismError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias using PrismError.
pub type Result<T> = std::result::Result<T, PrismError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        let err = PrismError::serialization("JSON", "unexpected end of input");
        assert!(err.is_serialization());
        assert!(!err.is_invalid_item());

        let err = PrismError::invalid_item("missing id");
        assert!(err.is_invalid_item());
    }

    #[test]
    fn test_display() {
        let err = PrismError::invalid_item("payload is null");
        assert_eq!(err.to_string(), "Invalid result item: payload is null");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PrismError = parse_err.into();
        assert!(err.is_serialization());
    }
}
