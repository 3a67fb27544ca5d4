use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::defects::DefectReport;

/// Report for a generation run, written as `generation_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationReport {
    pub dataset_version: String,
    pub seed: u64,
    pub as_of: NaiveDate,
    pub customers_requested: u64,
    /// Distinct customers generated before defect injection.
    pub rows_generated: u64,
    /// Rows in the raw artifact, duplicates included.
    pub rows_written: u64,
    pub churned: u64,
    pub churn_rate: f64,
    pub defects: DefectReport,
    pub raw_sha256: String,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// Result of [`crate::GenerationEngine::run`].
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub raw_path: PathBuf,
    pub plans_path: PathBuf,
    pub report_path: PathBuf,
    pub report: GenerationReport,
}
