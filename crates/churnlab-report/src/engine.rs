use std::path::Path;
use std::time::Instant;

use tracing::info;

use churnlab_clean::{CleaningSummary, read_clean_customers};
use churnlab_core::{CustomerRecord, write_bytes_atomic, write_json_atomic};

use crate::errors::ReportError;
use crate::metrics::{ChurnMetrics, compute_metrics};
use crate::model::{ReportOptions, ReportResult};
use crate::report::render_report;

pub const CHURN_METRICS_FILE: &str = "churn_metrics.json";
pub const SUMMARY_REPORT_FILE: &str = "churn_summary_report.txt";

/// Computes churn statistics over a clean dataset and renders the report.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    options: ReportOptions,
}

impl ReportEngine {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn metrics(&self, records: &[CustomerRecord]) -> Result<ChurnMetrics, ReportError> {
        self.options.validate()?;
        Ok(compute_metrics(records, self.options.top_factors))
    }

    /// Read `customers_clean.csv` (and optionally `cleaning_summary.json`) and
    /// write `churn_metrics.json` plus `churn_summary_report.txt` to `out_dir`.
    pub fn run(
        &self,
        clean_path: &Path,
        summary_path: Option<&Path>,
        out_dir: &Path,
    ) -> Result<ReportResult, ReportError> {
        let start = Instant::now();
        self.options.validate()?;
        info!(clean = %clean_path.display(), out_dir = %out_dir.display(), "report started");

        let records = read_clean_customers(clean_path)?;
        let summary: Option<CleaningSummary> = match summary_path {
            Some(path) => Some(serde_json::from_slice(&std::fs::read(path)?)?),
            None => None,
        };

        let metrics = self.metrics(&records)?;
        let report = render_report(summary.as_ref(), &metrics);

        std::fs::create_dir_all(out_dir)?;
        let metrics_path = out_dir.join(CHURN_METRICS_FILE);
        write_json_atomic(&metrics_path, &metrics)?;
        let report_path = out_dir.join(SUMMARY_REPORT_FILE);
        write_bytes_atomic(&report_path, report.as_bytes())?;

        info!(
            customers = metrics.totals.customers,
            churn_rate = metrics.totals.churn_rate,
            top_factor = metrics
                .top_factors
                .first()
                .map(|factor| factor.feature.as_str())
                .unwrap_or("none"),
            duration_ms = start.elapsed().as_millis() as u64,
            "report completed"
        );

        Ok(ReportResult {
            metrics_path,
            report_path,
            metrics,
            report,
        })
    }
}
