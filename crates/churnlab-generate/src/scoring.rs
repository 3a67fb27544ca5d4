//! Churn risk model.
//!
//! Churn is sampled from a logistic model so that the link between signals
//! and outcome is explicit and testable without any randomness:
//!
//! ```text
//! log_odds = logit(base_rate) + correlation_strength * sum(weight_i * signal_i)
//! p        = min(sigmoid(log_odds), max_probability)
//! ```
//!
//! Every weight is a log-odds increment and must be non-negative: signals can
//! only raise churn risk above the base rate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use churnlab_core::{AgeGroup, EngagementTier, PlanTier, Region};

use crate::config::{ChurnParams, validate_non_negative};
use crate::errors::GenerationError;

/// Sessions shorter than this (minutes) count as a short-session signal.
pub const SHORT_SESSION_MINUTES: f64 = 20.0;
/// Billing issues beyond this count add no further risk.
pub const MAX_BILLING_ISSUES_SCORED: u32 = 3;
/// Support tickets beyond this count add no further risk.
pub const MAX_SUPPORT_TICKETS_SCORED: u32 = 5;

/// Log-odds increments per churn signal.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ChurnWeights {
    /// Fewer than 3 logins per month.
    pub very_low_engagement: f64,
    /// 3 to 7 logins per month.
    pub low_engagement: f64,
    /// Average session shorter than 20 minutes.
    pub short_sessions: f64,
    pub standard_plan: f64,
    pub premium_plan: f64,
    /// Potential tenure under 6 months.
    pub new_customer: f64,
    /// Potential tenure of 6 to 11 months.
    pub early_customer: f64,
    /// Per billing issue, up to 3.
    pub per_billing_issue: f64,
    /// Per support ticket, up to 5.
    pub per_support_ticket: f64,
    /// Age groups 18-24 and 25-34.
    pub young_customer: f64,
    pub international: f64,
}

impl Default for ChurnWeights {
    fn default() -> Self {
        Self {
            very_low_engagement: 1.6,
            low_engagement: 0.7,
            short_sessions: 0.3,
            standard_plan: 0.25,
            premium_plan: 0.45,
            new_customer: 1.0,
            early_customer: 0.4,
            per_billing_issue: 0.55,
            per_support_ticket: 0.15,
            young_customer: 0.3,
            international: 0.55,
        }
    }
}

impl ChurnWeights {
    pub fn validate(&self) -> Result<(), GenerationError> {
        let weights = [
            ("churn.weights.very_low_engagement", self.very_low_engagement),
            ("churn.weights.low_engagement", self.low_engagement),
            ("churn.weights.short_sessions", self.short_sessions),
            ("churn.weights.standard_plan", self.standard_plan),
            ("churn.weights.premium_plan", self.premium_plan),
            ("churn.weights.new_customer", self.new_customer),
            ("churn.weights.early_customer", self.early_customer),
            ("churn.weights.per_billing_issue", self.per_billing_issue),
            ("churn.weights.per_support_ticket", self.per_support_ticket),
            ("churn.weights.young_customer", self.young_customer),
            ("churn.weights.international", self.international),
        ];
        for (name, value) in weights {
            validate_non_negative(name, value)?;
        }
        Ok(())
    }
}

/// Per-customer inputs of the churn model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChurnSignals {
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    pub support_tickets: u32,
    pub billing_issues_count: u32,
    /// Tenure the customer would reach if still active at the reference date.
    pub potential_tenure_months: i64,
    pub plan: PlanTier,
    pub age_group: AgeGroup,
    pub region: Region,
}

/// Logistic churn model built from [`ChurnParams`].
#[derive(Debug, Clone)]
pub struct ChurnModel {
    intercept: f64,
    strength: f64,
    max_probability: f64,
    weights: ChurnWeights,
}

impl ChurnModel {
    pub fn new(params: &ChurnParams) -> Self {
        Self {
            intercept: logit(params.base_rate),
            strength: params.correlation_strength,
            max_probability: params.max_probability,
            weights: params.weights.clone(),
        }
    }

    /// Unscaled sum of weighted signals.
    pub fn signal_score(&self, signals: &ChurnSignals) -> f64 {
        let w = &self.weights;
        let mut score = 0.0;

        score += match EngagementTier::from_logins(signals.avg_monthly_logins) {
            EngagementTier::VeryLow => w.very_low_engagement,
            EngagementTier::Low => w.low_engagement,
            EngagementTier::Medium | EngagementTier::High => 0.0,
        };
        if signals.avg_session_minutes < SHORT_SESSION_MINUTES {
            score += w.short_sessions;
        }
        score += match signals.plan {
            PlanTier::Basic => 0.0,
            PlanTier::Standard => w.standard_plan,
            PlanTier::Premium => w.premium_plan,
        };
        if signals.potential_tenure_months < 6 {
            score += w.new_customer;
        } else if signals.potential_tenure_months < 12 {
            score += w.early_customer;
        }
        score += w.per_billing_issue
            * f64::from(signals.billing_issues_count.min(MAX_BILLING_ISSUES_SCORED));
        score += w.per_support_ticket
            * f64::from(signals.support_tickets.min(MAX_SUPPORT_TICKETS_SCORED));
        if signals.age_group.is_young() {
            score += w.young_customer;
        }
        if signals.region == Region::International {
            score += w.international;
        }

        score
    }

    pub fn log_odds(&self, signals: &ChurnSignals) -> f64 {
        self.intercept + self.strength * self.signal_score(signals)
    }

    /// Churn probability in `[0, max_probability]`.
    pub fn probability(&self, signals: &ChurnSignals) -> f64 {
        sigmoid(self.log_odds(signals)).clamp(0.0, self.max_probability)
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_customer() -> ChurnSignals {
        ChurnSignals {
            avg_monthly_logins: 20.0,
            avg_session_minutes: 60.0,
            support_tickets: 0,
            billing_issues_count: 0,
            potential_tenure_months: 30,
            plan: PlanTier::Basic,
            age_group: AgeGroup::From45To54,
            region: Region::Midwest,
        }
    }

    fn model() -> ChurnModel {
        ChurnModel::new(&ChurnParams::default())
    }

    #[test]
    fn no_signals_yields_base_rate() {
        let p = model().probability(&quiet_customer());
        assert!((p - 0.10).abs() < 1e-9, "p = {p}");
    }

    #[test]
    fn low_engagement_raises_probability() {
        let model = model();
        let base = model.probability(&quiet_customer());
        let low = model.probability(&ChurnSignals {
            avg_monthly_logins: 5.0,
            ..quiet_customer()
        });
        let very_low = model.probability(&ChurnSignals {
            avg_monthly_logins: 1.0,
            ..quiet_customer()
        });
        assert!(base < low && low < very_low);
    }

    #[test]
    fn billing_issues_raise_probability_up_to_cap() {
        let model = model();
        let scores: Vec<f64> = [0, 1, 2, 3, 7]
            .into_iter()
            .map(|billing_issues_count| {
                model.probability(&ChurnSignals {
                    billing_issues_count,
                    ..quiet_customer()
                })
            })
            .collect();
        assert!(scores.windows(2).take(3).all(|pair| pair[0] < pair[1]));
        assert_eq!(scores[3], scores[4]);
    }

    #[test]
    fn zero_strength_ignores_signals() {
        let params = ChurnParams {
            correlation_strength: 0.0,
            ..ChurnParams::default()
        };
        let model = ChurnModel::new(&params);
        let risky = ChurnSignals {
            avg_monthly_logins: 0.0,
            billing_issues_count: 3,
            potential_tenure_months: 1,
            region: Region::International,
            ..quiet_customer()
        };
        assert!((model.probability(&risky) - 0.10).abs() < 1e-9);
    }

    #[test]
    fn probability_is_capped() {
        let params = ChurnParams {
            base_rate: 0.9,
            correlation_strength: 5.0,
            ..ChurnParams::default()
        };
        let model = ChurnModel::new(&params);
        let risky = ChurnSignals {
            avg_monthly_logins: 0.0,
            billing_issues_count: 3,
            ..quiet_customer()
        };
        assert_eq!(model.probability(&risky), 0.95);
    }

    #[test]
    fn degenerate_base_rates_stay_in_bounds() {
        for base_rate in [0.0, 1.0] {
            let model = ChurnModel::new(&ChurnParams {
                base_rate,
                max_probability: 1.0,
                ..ChurnParams::default()
            });
            let p = model.probability(&quiet_customer());
            assert_eq!(p, base_rate);
        }
    }

    #[test]
    fn negative_weights_are_rejected() {
        let weights = ChurnWeights {
            international: -0.1,
            ..ChurnWeights::default()
        };
        assert!(weights.validate().is_err());
    }
}
