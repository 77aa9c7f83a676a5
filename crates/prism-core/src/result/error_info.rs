//! Error taxonomy for analysis failures.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Closed taxonomy of analysis error codes.
///
/// Wire codes outside this set (older backends emit finer-grained codes such
/// as `PYTHON_SYNTAX`) normalize to [`ErrorCode::AnalysisError`] via
/// [`ErrorCode::from_wire`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// General/unclassified analysis error.
    #[default]
    AnalysisError,
    /// Analysis timed out.
    AnalysisTimeout,
    /// Analysis was cancelled.
    AnalysisCancelled,
    /// Python code execution failed.
    PythonExecution,
    /// Requested data not found.
    DataNotFound,
    /// Connection to a backing service failed.
    ConnectionFailed,
}

impl ErrorCode {
    /// Parses a wire code, mapping anything unrecognized to the default.
    pub fn from_wire(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }
}

/// Detailed error information for one session, with recovery suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Error code from the closed taxonomy.
    pub code: ErrorCode,
    /// User-facing error message.
    pub message: String,
    /// Technical details (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Suggested next steps for the user.
    #[serde(default)]
    pub recovery_suggestions: Vec<String>,
    /// When the error occurred (Unix milliseconds).
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_wire_known_codes() {
        assert_eq!(ErrorCode::from_wire("ANALYSIS_TIMEOUT"), ErrorCode::AnalysisTimeout);
        assert_eq!(ErrorCode::from_wire("PYTHON_EXECUTION"), ErrorCode::PythonExecution);
        assert_eq!(ErrorCode::from_wire("CONNECTION_FAILED"), ErrorCode::ConnectionFailed);
    }

    #[test]
    fn test_from_wire_unknown_maps_to_default() {
        assert_eq!(ErrorCode::from_wire("PYTHON_SYNTAX"), ErrorCode::AnalysisError);
        assert_eq!(ErrorCode::from_wire(""), ErrorCode::AnalysisError);
    }

    #[test]
    fn test_wire_spelling_round_trip() {
        assert_eq!(
            serde_json::to_value(ErrorCode::DataNotFound).unwrap(),
            json!("DATA_NOT_FOUND")
        );
        let code: ErrorCode = serde_json::from_value(json!("ANALYSIS_CANCELLED")).unwrap();
        assert_eq!(code, ErrorCode::AnalysisCancelled);
        // strum Display matches the serde spelling
        assert_eq!(ErrorCode::AnalysisTimeout.to_string(), "ANALYSIS_TIMEOUT");
    }

    #[test]
    fn test_error_info_serde() {
        let info = ErrorInfo {
            code: ErrorCode::DataNotFound,
            message: "table not found".to_string(),
            details: None,
            recovery_suggestions: vec!["Check the data source configuration".to_string()],
            timestamp: 1700000000000,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["code"], json!("DATA_NOT_FOUND"));
        assert_eq!(value["recoverySuggestions"][0], json!("Check the data source configuration"));
    }
}
