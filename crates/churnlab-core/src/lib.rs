//! Core contracts and helpers for churnlab.
//!
//! This crate defines the customer record shapes (raw and clean), the fixed
//! reference catalog, derived-metric helpers, row constraints, and artifact
//! writers shared by the generator, the cleaner, and the reporting stage.

pub mod artifact;
pub mod catalog;
pub mod constraints;
pub mod error;
pub mod record;

pub use artifact::{sha256_hex, to_csv_bytes, write_bytes_atomic, write_json_atomic};
pub use catalog::{
    AgeGroup, BillingTier, CANCELLATION_REASONS, EngagementTier, PAYMENT_METHODS, PlanCatalog,
    PlanEntry, PlanTier, REGIONS, Region, TenureTier, UNKNOWN_REGION,
};
pub use constraints::{ConstraintViolation, check_record};
pub use error::{DataIssue, Error, IssueKind, Result};
pub use record::{
    CUSTOMER_COLUMNS, CustomerRecord, DATE_FORMAT, Lifetime, RawCustomer, format_date, lifetime,
};

/// Contract version for the customer dataset artifacts.
pub const DATASET_VERSION: &str = "0.1";

/// Default reference date ("now") used for durations of active customers.
pub fn default_as_of() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 9, 30).unwrap_or_default()
}
