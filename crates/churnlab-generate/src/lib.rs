//! Synthetic customer dataset generator for churnlab.
//!
//! Produces seeded, reproducible customer records whose churn outcome is
//! sampled from an explicit logistic risk model, then corrupts a configurable
//! subset of rows to simulate real-world data quality problems.

pub mod config;
pub mod defects;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod sampling;
pub mod scoring;

pub use config::{ChurnParams, DateWindow, DefectConfig, EngagementParams, GeneratorConfig};
pub use engine::{GeneratedDataset, GenerationEngine};
pub use errors::GenerationError;
pub use model::{GenerationReport, GenerationResult};
pub use scoring::{ChurnModel, ChurnSignals, ChurnWeights};
