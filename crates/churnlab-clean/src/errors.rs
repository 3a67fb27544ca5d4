use thiserror::Error;

/// Errors emitted by the cleaning engine.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("artifact error: {0}")]
    Artifact(#[from] churnlab_core::Error),
}
