use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ReportError;
use crate::metrics::ChurnMetrics;

/// Options for the reporting stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ReportOptions {
    /// Number of churn factors called out in the report.
    pub top_factors: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { top_factors: 3 }
    }
}

impl ReportOptions {
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.top_factors == 0 {
            return Err(ReportError::InvalidConfiguration(
                "top_factors must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of [`crate::ReportEngine::run`].
#[derive(Debug, Clone)]
pub struct ReportResult {
    pub metrics_path: PathBuf,
    pub report_path: PathBuf,
    pub metrics: ChurnMetrics,
    pub report: String,
}
