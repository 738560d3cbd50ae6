//! Error types for the credit risk service.

use thiserror::Error;

/// Core error type for preprocessing, inference and artifact handling
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Malformed request shape
    #[error("Validation error: {0}")]
    Validation(String),

    /// Batch or schema is structurally inconsistent (ragged columns, duplicates)
    #[error("Schema error: {0}")]
    Schema(String),

    /// One or more fields could not be turned into model features
    #[error("Feature error: {reason}: {}", .fields.join(", "))]
    Feature {
        /// Offending field names
        fields: Vec<String>,
        /// What went wrong with them
        reason: String,
    },

    /// A model, encoder or scaler artifact could not be loaded or is inconsistent
    #[error("Failed to load artifact {path}: {reason}")]
    ArtifactLoad {
        /// Artifact path (or logical name for in-memory artifacts)
        path: String,
        /// Failure description
        reason: String,
    },

    /// Model evaluation failed
    #[error("Prediction error: {0}")]
    Prediction(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a feature error for a set of fields
    pub fn feature<I, S>(fields: I, reason: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::Feature {
            fields: fields.into_iter().map(Into::into).collect(),
            reason: reason.into(),
        }
    }

    /// Build an artifact load error
    pub fn artifact(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ArtifactLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Schema(_) | Error::Feature { .. }
        )
    }

    /// Field names attached to the error, if any
    #[must_use]
    pub fn fields(&self) -> &[String] {
        match self {
            Error::Feature { fields, .. } => fields,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("features must be an object".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: features must be an object"
        );
    }

    #[test]
    fn test_feature_error_lists_fields() {
        let err = Error::feature(["AMT_CREDIT", "CODE_GENDER"], "missing required field");
        assert_eq!(
            err.to_string(),
            "Feature error: missing required field: AMT_CREDIT, CODE_GENDER"
        );
        assert_eq!(err.fields().len(), 2);
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Schema("ragged".into()).is_client_error());
        assert!(Error::feature(["X"], "bad").is_client_error());
        assert!(!Error::Prediction("boom".into()).is_client_error());
        assert!(!Error::artifact("models/model.json", "missing").is_client_error());
    }
}
