use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use churnlab_core::{UNKNOWN_REGION, default_as_of};

use crate::errors::CleanError;

/// How duplicate raw rows are identified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Rows identical in every field.
    #[default]
    ExactRow,
    /// Rows sharing a `customer_id`; the first occurrence is kept.
    CustomerId,
}

/// Options for the cleaning engine.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct CleanOptions {
    /// Reference date for durations of active customers.
    pub as_of: NaiveDate,
    /// Recognized date formats, tried in order.
    pub date_formats: Vec<String>,
    pub dedup: DedupStrategy,
    /// Sentinel for missing or unrecognized regions.
    pub unknown_region: String,
    /// Write the normalized load tables under `tables/`.
    pub export_tables: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            as_of: default_as_of(),
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%m/%d/%Y".to_string(),
                "%Y/%m/%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
            ],
            dedup: DedupStrategy::ExactRow,
            unknown_region: UNKNOWN_REGION.to_string(),
            export_tables: true,
        }
    }
}

impl CleanOptions {
    pub fn validate(&self) -> Result<(), CleanError> {
        if self.date_formats.is_empty() {
            return Err(CleanError::InvalidConfiguration(
                "date_formats must list at least one format".to_string(),
            ));
        }
        for format in &self.date_formats {
            if format.trim().is_empty()
                || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
            {
                return Err(CleanError::InvalidConfiguration(format!(
                    "date format '{format}' is not a valid strftime pattern"
                )));
            }
        }
        if self.unknown_region.trim().is_empty() {
            return Err(CleanError::InvalidConfiguration(
                "unknown_region must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-stage counts of a cleaning pass, written as `cleaning_summary.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleaningSummary {
    pub rows_in: u64,
    pub duplicates_removed: u64,
    /// Values re-cased or trimmed, by field.
    pub text_normalized: BTreeMap<String, u64>,
    /// Dates rewritten into the canonical format, by field.
    pub dates_normalized: BTreeMap<String, u64>,
    /// Values nulled because no rule recognized them, by field.
    pub unparseable_values: BTreeMap<String, u64>,
    pub prices_filled: u64,
    pub prices_corrected: u64,
    pub regions_filled: u64,
    pub regions_unrecognized: u64,
    /// Rows excluded for breaking at least one invariant.
    pub invariant_violations: u64,
    pub violations_by_code: BTreeMap<String, u64>,
    /// Rows whose derived fields changed on recompute.
    pub derived_recomputed: u64,
    pub rows_out: u64,
}

impl CleaningSummary {
    /// Every raw row is either removed as a duplicate, excluded as invalid,
    /// or present in the clean output.
    pub fn is_conserved(&self) -> bool {
        self.rows_in == self.duplicates_removed + self.invariant_violations + self.rows_out
    }

    pub fn unparseable_total(&self) -> u64 {
        self.unparseable_values.values().sum()
    }

    pub(crate) fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// Result of [`crate::CleaningEngine::run`].
#[derive(Debug, Clone)]
pub struct CleaningResult {
    pub clean_path: PathBuf,
    pub summary_path: PathBuf,
    pub issues_path: PathBuf,
    pub tables_dir: Option<PathBuf>,
    pub summary: CleaningSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        CleanOptions::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_or_broken_formats() {
        let options = CleanOptions {
            date_formats: Vec::new(),
            ..CleanOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(CleanError::InvalidConfiguration(_))
        ));

        let options = CleanOptions {
            date_formats: vec!["%Y-%m-%d".to_string(), "%J".to_string()],
            ..CleanOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn conservation_counts_every_row() {
        let summary = CleaningSummary {
            rows_in: 10,
            duplicates_removed: 2,
            invariant_violations: 1,
            rows_out: 7,
            ..CleaningSummary::default()
        };
        assert!(summary.is_conserved());
        assert!(!CleaningSummary { rows_out: 6, ..summary }.is_conserved());
    }
}
