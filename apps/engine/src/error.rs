//! Error types for the citation search engine

use serde_json::{json, Value as JsonValue};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value for parameter '{name}': '{value}' ({reason})")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Store operation timed out: {0}")]
    StoreTimeout(&'static str),

    #[error("Audit log error: {0}")]
    AuditLog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// True for failures caused by the request rather than by the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::MissingParameter(_) | Error::InvalidParameter { .. }
        )
    }

    /// FHIR issue type code for this error.
    pub fn issue_code(&self) -> &'static str {
        match self {
            Error::MissingParameter(_) => "required",
            Error::InvalidParameter { .. } => "value",
            Error::StoreTimeout(_) => "timeout",
            Error::Database(_)
            | Error::AuditLog(_)
            | Error::Config(_)
            | Error::Other(_) => "exception",
        }
    }

    /// Render as a FHIR `OperationOutcome` with one error issue.
    pub fn to_operation_outcome(&self) -> JsonValue {
        let diagnostics = if self.is_client_error() {
            self.to_string()
        } else {
            tracing::error!("Internal error: {}", self);
            "Internal search error".to_string()
        };

        json!({
            "resourceType": "OperationOutcome",
            "issue": [{
                "severity": "error",
                "code": self.issue_code(),
                "diagnostics": diagnostics
            }]
        })
    }
}
