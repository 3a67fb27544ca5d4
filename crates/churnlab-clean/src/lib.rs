//! Deterministic cleaner for raw churnlab customer data.
//!
//! Raw rows pass through a fixed sequence of repair stages (deduplication,
//! text normalization, parsing, missing-value repair, validation). Every
//! rule is a pure function so it can be tested on crafted rows, and every
//! change is counted in the [`CleaningSummary`].

pub mod engine;
pub mod errors;
pub mod export;
pub mod model;
pub mod stages;

pub use engine::{
    CLEAN_CUSTOMERS_FILE, CLEANING_SUMMARY_FILE, CleanedDataset, CleaningEngine, DATA_ISSUES_FILE,
    read_clean_customers, read_raw_customers,
};
pub use errors::CleanError;
pub use model::{CleanOptions, CleaningResult, CleaningSummary, DedupStrategy};
pub use stages::Repaired;
