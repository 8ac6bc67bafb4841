use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wire-level classification of a failed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UserInput,
    MethodNotAllowed,
    Configuration,
    ExtractionProvider,
    MalformedExtraction,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UserInput => write!(f, "user_input"),
            ErrorKind::MethodNotAllowed => write!(f, "method_not_allowed"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::ExtractionProvider => write!(f, "extraction_provider"),
            ErrorKind::MalformedExtraction => write!(f, "malformed_extraction"),
        }
    }
}

/// Failures that end a scan request. Directory problems never show up here:
/// they degrade to a missing email instead.
#[derive(Debug, Clone, Error)]
pub enum ScanError {
    #[error("{0}")]
    UserInput(String),
    #[error("Server configuration error: {0}")]
    Configuration(String),
    #[error("Vision provider error: {message}")]
    ExtractionProvider {
        message: String,
        /// Provider payload, passed through untouched.
        details: Option<Value>,
    },
    #[error("Failed to parse vision provider response: {message}")]
    MalformedExtraction { message: String, raw: Value },
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::UserInput(_) => ErrorKind::UserInput,
            ScanError::Configuration(_) => ErrorKind::Configuration,
            ScanError::ExtractionProvider { .. } => ErrorKind::ExtractionProvider,
            ScanError::MalformedExtraction { .. } => ErrorKind::MalformedExtraction,
        }
    }

    /// Upstream diagnostic payload, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ScanError::ExtractionProvider { details, .. } => details.as_ref(),
            ScanError::MalformedExtraction { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_and_parse_failures_are_distinct() {
        let outage = ScanError::ExtractionProvider {
            message: "status 503".into(),
            details: Some(Value::String("overloaded".into())),
        };
        let garbled = ScanError::MalformedExtraction {
            message: "expected value at line 1 column 1".into(),
            raw: Value::String("not json".into()),
        };
        assert_ne!(outage.kind(), garbled.kind());
        assert!(garbled.to_string().starts_with("Failed to parse"));
        assert_eq!(outage.details(), Some(&Value::String("overloaded".into())));
    }

    #[test]
    fn kind_display_matches_serde() {
        for kind in [
            ErrorKind::UserInput,
            ErrorKind::MethodNotAllowed,
            ErrorKind::Configuration,
            ErrorKind::ExtractionProvider,
            ErrorKind::MalformedExtraction,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), Value::String(kind.to_string()));
        }
    }
}
