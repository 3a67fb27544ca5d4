use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use churnlab_core::{
    CUSTOMER_COLUMNS, CustomerRecord, DataIssue, PlanCatalog, RawCustomer, to_csv_bytes,
    write_bytes_atomic, write_json_atomic,
};

use crate::errors::CleanError;
use crate::export::{TABLES_DIR, write_tables};
use crate::model::{CleanOptions, CleaningResult, CleaningSummary};
use crate::stages::dedup::{Admission, IdLedger, deduplicate};
use crate::stages::missing::repair_row;
use crate::stages::parse::{ParsedCustomer, parse_row};
use crate::stages::text::{Vocabulary, normalize_row};
use crate::stages::validate::{Validated, validate_row};

pub const CLEAN_CUSTOMERS_FILE: &str = "customers_clean.csv";
pub const CLEANING_SUMMARY_FILE: &str = "cleaning_summary.json";
pub const DATA_ISSUES_FILE: &str = "data_issues.json";

/// In-memory output of a cleaning pass.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    pub records: Vec<CustomerRecord>,
    /// Unparseable values and rejected rows, in row order.
    pub issues: Vec<DataIssue>,
    pub summary: CleaningSummary,
}

/// Runs the repair stages in their fixed order.
#[derive(Debug, Clone)]
pub struct CleaningEngine {
    options: CleanOptions,
    catalog: PlanCatalog,
    vocabulary: Vocabulary,
}

impl CleaningEngine {
    pub fn new(options: CleanOptions) -> Self {
        Self {
            options,
            catalog: PlanCatalog::standard(),
            vocabulary: Vocabulary::standard(),
        }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    pub fn clean(&self, raw: Vec<RawCustomer>) -> Result<CleanedDataset, CleanError> {
        self.options.validate()?;
        let mut summary = CleaningSummary {
            rows_in: raw.len() as u64,
            ..CleaningSummary::default()
        };
        let mut issues = Vec::new();

        let (mut rows, removed) = deduplicate(raw, self.options.dedup);
        summary.duplicates_removed = removed;
        info!(
            strategy = ?self.options.dedup,
            removed,
            remaining = rows.len(),
            "dedup stage completed"
        );

        for row in &mut rows {
            for field in normalize_row(row, &self.vocabulary) {
                CleaningSummary::bump(&mut summary.text_normalized, field);
            }
        }
        info!(normalized = ?summary.text_normalized, "text stage completed");

        let mut parsed: Vec<ParsedCustomer> = Vec::with_capacity(rows.len());
        for row in rows {
            let outcome = parse_row(row, &self.options.date_formats);
            for field in outcome.normalized {
                CleaningSummary::bump(&mut summary.dates_normalized, field);
            }
            for issue in outcome.issues {
                let field = issue.field.as_deref().unwrap_or("unknown");
                CleaningSummary::bump(&mut summary.unparseable_values, field);
                debug!(customer_id = issue.customer_id, field, "value unparseable");
                issues.push(issue);
            }
            parsed.push(outcome.customer);
        }
        info!(
            normalized = ?summary.dates_normalized,
            unparseable = summary.unparseable_total(),
            "parse stage completed"
        );

        for customer in &mut parsed {
            let repairs = repair_row(
                customer,
                &self.catalog,
                &self.vocabulary.regions,
                &self.options.unknown_region,
            );
            summary.prices_filled += u64::from(repairs.price_filled);
            summary.prices_corrected += u64::from(repairs.price_corrected);
            summary.regions_filled += u64::from(repairs.region_filled);
            summary.regions_unrecognized += u64::from(repairs.region_unrecognized);
        }
        info!(
            prices_filled = summary.prices_filled,
            prices_corrected = summary.prices_corrected,
            regions_filled = summary.regions_filled,
            regions_unrecognized = summary.regions_unrecognized,
            "missing-value stage completed"
        );

        let mut ledger = IdLedger::default();
        for customer in parsed {
            match validate_row(customer, self.options.as_of) {
                Ok(Validated {
                    record,
                    derived_changed,
                }) => {
                    let id = record.customer_id;
                    match ledger.admit(record) {
                        Admission::Accepted => {
                            summary.derived_recomputed += u64::from(derived_changed);
                        }
                        Admission::Duplicate => {
                            summary.duplicates_removed += 1;
                            debug!(customer_id = id, "duplicate after normalization");
                        }
                        Admission::Conflict => {
                            let issue = DataIssue::violation(
                                id,
                                "duplicate_customer_id",
                                format!("customer_id {id} was already accepted with different values"),
                            );
                            summary.invariant_violations += 1;
                            CleaningSummary::bump(&mut summary.violations_by_code, &issue.code);
                            debug!(customer_id = id, code = %issue.code, "row rejected");
                            issues.push(issue);
                        }
                    }
                }
                Err(row_issues) => {
                    summary.invariant_violations += 1;
                    for issue in &row_issues {
                        CleaningSummary::bump(&mut summary.violations_by_code, &issue.code);
                        debug!(customer_id = issue.customer_id, code = %issue.code, "row rejected");
                    }
                    issues.extend(row_issues);
                }
            }
        }
        summary.rows_out = ledger.len() as u64;
        let records = ledger.into_records();
        info!(
            rejected = summary.invariant_violations,
            duplicates_removed = summary.duplicates_removed,
            derived_recomputed = summary.derived_recomputed,
            rows_out = summary.rows_out,
            "validation stage completed"
        );

        Ok(CleanedDataset {
            records,
            issues,
            summary,
        })
    }

    /// Clean the raw artifact at `raw_path` and write the clean dataset,
    /// summary, issue audit and (optionally) load tables into `out_dir`.
    pub fn run(&self, raw_path: &Path, out_dir: &Path) -> Result<CleaningResult, CleanError> {
        let start = Instant::now();
        self.options.validate()?;
        info!(
            raw = %raw_path.display(),
            out_dir = %out_dir.display(),
            as_of = %self.options.as_of,
            "cleaning started"
        );

        let raw = read_raw_customers(raw_path)?;
        let cleaned = self.clean(raw)?;
        std::fs::create_dir_all(out_dir)?;

        let clean_path = out_dir.join(CLEAN_CUSTOMERS_FILE);
        write_bytes_atomic(
            &clean_path,
            &to_csv_bytes(&CUSTOMER_COLUMNS, &cleaned.records)?,
        )?;

        let summary_path = out_dir.join(CLEANING_SUMMARY_FILE);
        write_json_atomic(&summary_path, &cleaned.summary)?;

        let issues_path = out_dir.join(DATA_ISSUES_FILE);
        write_json_atomic(&issues_path, &cleaned.issues)?;

        let tables_dir = if self.options.export_tables {
            let dir = out_dir.join(TABLES_DIR);
            let tables = write_tables(&dir, &cleaned.records, &self.catalog)?;
            info!(
                customers = tables.customers.len(),
                subscriptions = tables.subscriptions.len(),
                usage = tables.usage.len(),
                "load tables exported"
            );
            Some(dir)
        } else {
            None
        };

        let summary = cleaned.summary;
        info!(
            rows_in = summary.rows_in,
            rows_out = summary.rows_out,
            duplicates_removed = summary.duplicates_removed,
            invariant_violations = summary.invariant_violations,
            conserved = summary.is_conserved(),
            duration_ms = start.elapsed().as_millis() as u64,
            "cleaning completed"
        );

        Ok(CleaningResult {
            clean_path,
            summary_path,
            issues_path,
            tables_dir,
            summary,
        })
    }
}

/// Read a raw customer artifact. Structural problems (wrong column count,
/// non-numeric counters) are fatal; value-level defects are left to the stages.
pub fn read_raw_customers(path: &Path) -> Result<Vec<RawCustomer>, CleanError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<RawCustomer>, _>>()?;
    Ok(rows)
}

/// Read a clean customer artifact.
pub fn read_clean_customers(path: &Path) -> Result<Vec<CustomerRecord>, CleanError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<CustomerRecord>, _>>()?;
    Ok(rows)
}
