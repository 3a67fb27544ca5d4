use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use churnlab_core::default_as_of;

use crate::errors::GenerationError;
use crate::scoring::ChurnWeights;

/// Generator parameters. Every field has a default, so partial TOML files
/// are valid.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of distinct customers to generate (before duplicate injection).
    pub customers: i64,
    /// Seed for every random stream. Same seed + config yields identical output.
    pub seed: Option<u64>,
    /// Refuse to run without an explicit seed.
    pub require_seed: bool,
    /// Reference date ("now") for durations of active customers.
    pub as_of: NaiveDate,
    /// Window join dates are drawn from.
    pub join_window: DateWindow,
    /// Earliest cancellation, in days after joining.
    pub min_days_before_cancel: i64,
    /// Weights for age groups 18-24, 25-34, 35-44, 45-54, 55-64, 65+.
    pub age_group_weights: [f64; 6],
    /// Weights for Northeast, Southeast, Midwest, Southwest, West, International.
    pub region_weights: [f64; 6],
    /// Weights for Basic, Standard, Premium.
    pub plan_weights: [f64; 3],
    pub engagement: EngagementParams,
    pub churn: ChurnParams,
    pub defects: DefectConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            customers: 10_500,
            seed: Some(42),
            require_seed: true,
            as_of: default_as_of(),
            join_window: DateWindow::default(),
            min_days_before_cancel: 30,
            age_group_weights: [15.0, 30.0, 25.0, 15.0, 10.0, 5.0],
            region_weights: [20.0, 15.0, 20.0, 15.0, 20.0, 10.0],
            plan_weights: [40.0, 40.0, 20.0],
            engagement: EngagementParams::default(),
            churn: ChurnParams::default(),
            defects: DefectConfig::default(),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
        }
    }
}

/// Engagement and friction signal distributions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct EngagementParams {
    pub logins_mean: f64,
    pub logins_std_dev: f64,
    pub session_minutes_mean: f64,
    pub session_minutes_std_dev: f64,
    /// Poisson rate of support tickets.
    pub support_tickets_rate: f64,
    /// Poisson rate of billing issues.
    pub billing_issues_rate: f64,
}

impl Default for EngagementParams {
    fn default() -> Self {
        Self {
            logins_mean: 12.0,
            logins_std_dev: 7.0,
            session_minutes_mean: 45.0,
            session_minutes_std_dev: 20.0,
            support_tickets_rate: 0.5,
            billing_issues_rate: 0.3,
        }
    }
}

/// Churn model parameters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ChurnParams {
    /// Churn probability of a customer with no risk signals.
    pub base_rate: f64,
    /// Multiplier on every signal weight; 0 makes churn independent of signals.
    pub correlation_strength: f64,
    /// Upper bound on any single customer's churn probability.
    pub max_probability: f64,
    pub weights: ChurnWeights,
}

impl Default for ChurnParams {
    fn default() -> Self {
        Self {
            base_rate: 0.10,
            correlation_strength: 1.0,
            max_probability: 0.95,
            weights: ChurnWeights::default(),
        }
    }
}

/// Share of rows hit by each injected defect.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DefectConfig {
    /// Rows re-emitted verbatim (simulated re-submission).
    pub duplicate_rate: f64,
    pub null_price_rate: f64,
    pub null_region_rate: f64,
    /// Rows whose plan name is re-cased (lower, upper, or mixed).
    pub recase_plan_rate: f64,
    /// Rows whose join date is rendered in `alternate_date_format`.
    pub alternate_date_rate: f64,
    pub alternate_date_format: String,
    /// Rows whose join date is replaced by text no date format recognizes.
    pub unparseable_date_rate: f64,
    /// Churned rows whose cancellation date is moved before the join date.
    pub inverted_cancellation_rate: f64,
}

impl Default for DefectConfig {
    fn default() -> Self {
        Self {
            duplicate_rate: 0.02,
            null_price_rate: 0.05,
            null_region_rate: 0.03,
            recase_plan_rate: 0.10,
            alternate_date_rate: 0.08,
            alternate_date_format: "%m/%d/%Y".to_string(),
            unparseable_date_rate: 0.0,
            inverted_cancellation_rate: 0.0,
        }
    }
}

impl DefectConfig {
    /// Configuration with every defect disabled.
    pub fn none() -> Self {
        Self {
            duplicate_rate: 0.0,
            null_price_rate: 0.0,
            null_region_rate: 0.0,
            recase_plan_rate: 0.0,
            alternate_date_rate: 0.0,
            unparseable_date_rate: 0.0,
            inverted_cancellation_rate: 0.0,
            ..Self::default()
        }
    }
}

impl GeneratorConfig {
    /// Reject nonsensical parameters before anything is generated.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.customers <= 0 {
            return Err(invalid(format!(
                "customers must be > 0 (got {})",
                self.customers
            )));
        }
        if self.require_seed && self.seed.is_none() {
            return Err(invalid(
                "seed is required when require_seed is enabled".to_string(),
            ));
        }
        if self.join_window.start > self.join_window.end {
            return Err(invalid(format!(
                "join_window.start {} is after join_window.end {}",
                self.join_window.start, self.join_window.end
            )));
        }
        if self.join_window.end > self.as_of {
            return Err(invalid(format!(
                "join_window.end {} is after as_of {}",
                self.join_window.end, self.as_of
            )));
        }
        if self.min_days_before_cancel < 0 {
            return Err(invalid(
                "min_days_before_cancel must be >= 0".to_string(),
            ));
        }

        validate_weights("age_group_weights", &self.age_group_weights)?;
        validate_weights("region_weights", &self.region_weights)?;
        validate_weights("plan_weights", &self.plan_weights)?;

        let engagement = &self.engagement;
        validate_non_negative("engagement.logins_std_dev", engagement.logins_std_dev)?;
        validate_non_negative(
            "engagement.session_minutes_std_dev",
            engagement.session_minutes_std_dev,
        )?;
        validate_non_negative(
            "engagement.support_tickets_rate",
            engagement.support_tickets_rate,
        )?;
        validate_non_negative(
            "engagement.billing_issues_rate",
            engagement.billing_issues_rate,
        )?;
        if !engagement.logins_mean.is_finite() || !engagement.session_minutes_mean.is_finite() {
            return Err(invalid("engagement means must be finite".to_string()));
        }

        validate_probability("churn.base_rate", self.churn.base_rate)?;
        validate_probability("churn.max_probability", self.churn.max_probability)?;
        validate_non_negative(
            "churn.correlation_strength",
            self.churn.correlation_strength,
        )?;
        self.churn.weights.validate()?;

        let defects = &self.defects;
        validate_probability("defects.duplicate_rate", defects.duplicate_rate)?;
        validate_probability("defects.null_price_rate", defects.null_price_rate)?;
        validate_probability("defects.null_region_rate", defects.null_region_rate)?;
        validate_probability("defects.recase_plan_rate", defects.recase_plan_rate)?;
        validate_probability("defects.alternate_date_rate", defects.alternate_date_rate)?;
        validate_probability(
            "defects.unparseable_date_rate",
            defects.unparseable_date_rate,
        )?;
        validate_probability(
            "defects.inverted_cancellation_rate",
            defects.inverted_cancellation_rate,
        )?;
        validate_date_format(&defects.alternate_date_format)?;

        Ok(())
    }
}

fn invalid(message: String) -> GenerationError {
    GenerationError::InvalidConfiguration(message)
}

fn validate_probability(name: &str, value: f64) -> Result<(), GenerationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(format!("{name} must be between 0 and 1 (got {value})")));
    }
    Ok(())
}

pub(crate) fn validate_non_negative(name: &str, value: f64) -> Result<(), GenerationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("{name} must be finite and >= 0 (got {value})")));
    }
    Ok(())
}

fn validate_weights(name: &str, weights: &[f64]) -> Result<(), GenerationError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid(format!("{name} must be finite and >= 0")));
    }
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(invalid(format!("{name} must not all be zero")));
    }
    Ok(())
}

fn validate_date_format(format: &str) -> Result<(), GenerationError> {
    if format.trim().is_empty() {
        return Err(invalid(
            "defects.alternate_date_format must not be empty".to_string(),
        ));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid(format!(
            "defects.alternate_date_format '{format}' is not a valid strftime pattern"
        )));
    }
    Ok(())
}
