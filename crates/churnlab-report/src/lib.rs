//! Churn statistics and the plain-text findings report.

pub mod engine;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod report;

pub use engine::{CHURN_METRICS_FILE, ReportEngine, SUMMARY_REPORT_FILE};
pub use errors::ReportError;
pub use metrics::{
    ChurnMetrics, FeatureCorrelation, METRICS_VERSION, SegmentRate, Segments, Totals,
    compute_metrics, pearson,
};
pub use model::{ReportOptions, ReportResult};
pub use report::render_report;
