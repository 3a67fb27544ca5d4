use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type shared across churnlab crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Artifact could not be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Tabular artifact could not be encoded or decoded.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Structured artifact could not be encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results returned by churnlab crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal data quality findings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A value matched no recognized rule and was nulled.
    UnparseableValue,
    /// A cleaned row still breaks a required relationship and was excluded.
    InvariantViolation,
}

/// Audit entry for a single data quality finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataIssue {
    pub kind: IssueKind,
    pub code: String,
    pub customer_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl DataIssue {
    pub fn unparseable(customer_id: u64, field: &str, value: &str) -> Self {
        Self {
            kind: IssueKind::UnparseableValue,
            code: format!("unparseable_{field}"),
            customer_id,
            field: Some(field.to_string()),
            value: Some(value.to_string()),
            message: format!("{field} value '{value}' matched no recognized format"),
        }
    }

    pub fn violation(customer_id: u64, code: &str, message: String) -> Self {
        Self {
            kind: IssueKind::InvariantViolation,
            code: code.to_string(),
            customer_id,
            field: None,
            value: None,
            message,
        }
    }
}
