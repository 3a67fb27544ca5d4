use thiserror::Error;

/// Errors emitted by the reporting stage.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input error: {0}")]
    Input(#[from] churnlab_clean::CleanError),
    #[error("artifact error: {0}")]
    Artifact(#[from] churnlab_core::Error),
}
