use std::path::Path;
use std::time::Instant;

use chrono::Duration;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use churnlab_core::{
    CANCELLATION_REASONS, CustomerRecord, DATASET_VERSION, PAYMENT_METHODS, PlanCatalog,
    RawCustomer, lifetime, sha256_hex, write_bytes_atomic, write_json_atomic,
};

use crate::config::GeneratorConfig;
use crate::defects::{DefectReport, DefectSet};
use crate::errors::GenerationError;
use crate::model::{GenerationReport, GenerationResult};
use crate::output::csv::{raw_customers_csv, write_plans_csv};
use crate::output::{GENERATION_REPORT_FILE, PLANS_FILE, RAW_CUSTOMERS_FILE};
use crate::sampling::{Sampler, date_between, hash_row_seed, hash_seed};
use crate::scoring::{ChurnModel, ChurnSignals};

/// In-memory output of a generation pass.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    /// Seed actually used (drawn from the OS when the config has none).
    pub seed: u64,
    /// Uncorrupted customers, one per id.
    pub customers: Vec<CustomerRecord>,
    /// Customers after defect injection, duplicates appended last.
    pub raw: Vec<RawCustomer>,
    pub defects: DefectReport,
}

impl GeneratedDataset {
    pub fn churned(&self) -> u64 {
        self.customers.iter().filter(|c| c.is_churned).count() as u64
    }

    pub fn churn_rate(&self) -> f64 {
        if self.customers.is_empty() {
            return 0.0;
        }
        self.churned() as f64 / self.customers.len() as f64
    }
}

/// Entry point for generating the raw customer dataset.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    config: GeneratorConfig,
}

impl GenerationEngine {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate customers and inject defects without touching the filesystem.
    pub fn generate(&self) -> Result<GeneratedDataset, GenerationError> {
        self.config.validate()?;
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let sampler = Sampler::new(&self.config)?;
        let model = ChurnModel::new(&self.config.churn);

        let stream_seed = hash_seed(seed, "customers");
        let customers: Vec<CustomerRecord> = (0..self.config.customers as u64)
            .map(|row_index| {
                let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(stream_seed, row_index));
                self.customer(row_index + 1, &sampler, &model, &mut rng)
            })
            .collect();

        let raw: Vec<RawCustomer> = customers.iter().map(RawCustomer::from).collect();
        let (raw, defects) = DefectSet::from_config(&self.config.defects).inject(raw, seed);
        for (id, count) in &defects.applied {
            debug!(defect = %id, rows = count, "defect injected");
        }

        Ok(GeneratedDataset {
            seed,
            customers,
            raw,
            defects,
        })
    }

    /// Generate and write `customers_raw.csv`, `plans.csv` and
    /// `generation_report.json` into `out_dir`. Nothing is written when the
    /// configuration is invalid.
    pub fn run(&self, out_dir: &Path) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        self.config.validate()?;
        info!(
            customers = self.config.customers,
            seed = ?self.config.seed,
            as_of = %self.config.as_of,
            out_dir = %out_dir.display(),
            "generation started"
        );

        let dataset = self.generate()?;
        std::fs::create_dir_all(out_dir)?;

        let raw_path = out_dir.join(RAW_CUSTOMERS_FILE);
        let raw_bytes = raw_customers_csv(&dataset.raw)?;
        write_bytes_atomic(&raw_path, &raw_bytes)?;

        let plans_path = out_dir.join(PLANS_FILE);
        let plan_bytes = write_plans_csv(&plans_path, &PlanCatalog::standard())?;

        let report = GenerationReport {
            dataset_version: DATASET_VERSION.to_string(),
            seed: dataset.seed,
            as_of: self.config.as_of,
            customers_requested: self.config.customers as u64,
            rows_generated: dataset.customers.len() as u64,
            rows_written: dataset.raw.len() as u64,
            churned: dataset.churned(),
            churn_rate: dataset.churn_rate(),
            defects: dataset.defects.clone(),
            raw_sha256: sha256_hex(&raw_bytes),
            bytes_written: raw_bytes.len() as u64 + plan_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        let report_path = out_dir.join(GENERATION_REPORT_FILE);
        write_json_atomic(&report_path, &report)?;

        info!(
            seed = report.seed,
            rows_written = report.rows_written,
            churn_rate = report.churn_rate,
            duplicates = report.defects.duplicates(),
            duration_ms = report.duration_ms,
            "generation completed"
        );

        Ok(GenerationResult {
            raw_path,
            plans_path,
            report_path,
            report,
        })
    }

    fn customer(
        &self,
        customer_id: u64,
        sampler: &Sampler,
        model: &ChurnModel,
        rng: &mut ChaCha8Rng,
    ) -> CustomerRecord {
        let config = &self.config;
        let age_group = sampler.age_group(rng);
        let age = sampler.age(age_group, rng);
        let region = sampler.region(rng);
        let plan = sampler.plan(rng);
        let payment_method = PAYMENT_METHODS[rng.random_range(0..PAYMENT_METHODS.len())];
        let join_date = date_between(config.join_window.start, config.join_window.end, rng);

        let avg_monthly_logins = sampler.logins(rng);
        let avg_session_minutes = sampler.session_minutes(rng);
        let support_tickets = sampler.support_tickets(rng);
        let billing_issues_count = sampler.billing_issues(rng);

        let signals = ChurnSignals {
            avg_monthly_logins,
            avg_session_minutes,
            support_tickets,
            billing_issues_count,
            potential_tenure_months: lifetime(join_date, None, config.as_of).months,
            plan,
            age_group,
            region,
        };
        let is_churned = rng.random_bool(model.probability(&signals));

        let (cancellation_date, cancellation_reason) = if is_churned {
            let earliest = join_date + Duration::days(config.min_days_before_cancel);
            let earliest = if earliest > config.as_of {
                join_date
            } else {
                earliest
            };
            let date = date_between(earliest, config.as_of, rng);
            let reason = CANCELLATION_REASONS[rng.random_range(0..CANCELLATION_REASONS.len())];
            (Some(date), Some(reason.to_string()))
        } else {
            (None, None)
        };

        let life = lifetime(join_date, cancellation_date, config.as_of);
        CustomerRecord {
            customer_id,
            age,
            age_group: age_group.label().to_string(),
            region: region.name().to_string(),
            plan_name: plan.name().to_string(),
            plan_price: plan.price(),
            payment_method: payment_method.to_string(),
            join_date,
            tenure_months: life.months,
            avg_monthly_logins,
            avg_session_minutes,
            support_tickets,
            billing_issues_count,
            is_churned,
            cancellation_date,
            cancellation_reason,
            customer_lifetime_days: life.days,
        }
    }
}
