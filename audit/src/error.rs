//! Structured extraction errors.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Extraction error with a stable code and key/value context.
///
/// Only [`ErrorCode::EmptyDocument`] and [`ErrorCode::UnsupportedDocument`]
/// ever reach callers of extraction; the rest are raised inside optional steps
/// and logged there.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AuditError {
    pub code: ErrorCode,
    pub message: String,
    pub details: ErrorDetails,
}

impl AuditError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: ErrorDetails::default(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.0.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "error": true,
            "code": self.code,
            "message": self.message,
        });

        if !self.details.0.is_empty() {
            let details: Map<String, Value> = self
                .details
                .0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            obj["details"] = Value::Object(details);
        }

        obj
    }
}

impl Serialize for AuditError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Nothing but whitespace after stripping a BOM.
    EmptyDocument,
    /// Cannot be interpreted as an audit report.
    UnsupportedDocument,
    /// A configured pattern failed to compile.
    InvalidPattern,
    /// A configured table entry violates its invariant.
    InvalidConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorDetails(pub Vec<(String, String)>);

#[cfg(test)]
mod tests {
    use super::{AuditError, ErrorCode};

    #[test]
    fn json_includes_details() {
        let err = AuditError::new(ErrorCode::InvalidPattern, "bad regex")
            .with_detail("pattern", "(unclosed");
        let json = err.to_json();
        assert_eq!(json["code"], "invalid_pattern");
        assert_eq!(json["details"]["pattern"], "(unclosed");
        assert_eq!(err.detail("pattern"), Some("(unclosed"));
    }

    #[test]
    fn json_omits_empty_details() {
        let json = AuditError::new(ErrorCode::EmptyDocument, "empty").to_json();
        assert!(json.get("details").is_none());
    }
}
