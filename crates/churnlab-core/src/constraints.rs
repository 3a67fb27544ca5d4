//! Row-level constraints mirrored from the relational schema the clean
//! dataset is loaded into.

use serde::{Deserialize, Serialize};

use crate::catalog::PlanTier;
use crate::record::CustomerRecord;

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 100;

/// A broken row constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub code: String,
    pub message: String,
}

impl ConstraintViolation {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
        }
    }
}

/// Check a canonical row against the schema constraints and the churn
/// invariants. An empty result means the row may be loaded.
pub fn check_record(record: &CustomerRecord) -> Vec<ConstraintViolation> {
    let mut violations = Vec::new();

    if !(MIN_AGE..=MAX_AGE).contains(&record.age) {
        violations.push(ConstraintViolation::new(
            "age_out_of_range",
            format!("age {} outside [{MIN_AGE}, {MAX_AGE}]", record.age),
        ));
    }

    if PlanTier::from_name(&record.plan_name).is_none() {
        violations.push(ConstraintViolation::new(
            "unknown_plan",
            format!("plan '{}' is not in the plan catalog", record.plan_name),
        ));
    }

    if !(record.plan_price > 0.0) {
        violations.push(ConstraintViolation::new(
            "non_positive_price",
            format!("plan_price {} must be > 0", record.plan_price),
        ));
    }

    match (record.is_churned, record.cancellation_date) {
        (true, None) => violations.push(ConstraintViolation::new(
            "churn_without_cancellation",
            "churned customer has no cancellation_date".to_string(),
        )),
        (false, Some(date)) => violations.push(ConstraintViolation::new(
            "cancellation_without_churn",
            format!("active customer has cancellation_date {date}"),
        )),
        (true, Some(date)) if date < record.join_date => {
            violations.push(ConstraintViolation::new(
                "cancellation_before_join",
                format!(
                    "cancellation_date {date} is before join_date {}",
                    record.join_date
                ),
            ))
        }
        _ => {}
    }

    if record.is_churned != record.cancellation_reason.is_some() {
        violations.push(ConstraintViolation::new(
            "reason_churn_mismatch",
            "cancellation_reason must be set iff the customer churned".to_string(),
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record() -> CustomerRecord {
        CustomerRecord {
            customer_id: 1,
            age: 40,
            age_group: "35-44".to_string(),
            region: "Midwest".to_string(),
            plan_name: "Standard".to_string(),
            plan_price: 15.99,
            payment_method: "Debit Card".to_string(),
            join_date: NaiveDate::from_ymd_opt(2023, 5, 10).unwrap(),
            tenure_months: 3,
            avg_monthly_logins: 4.0,
            avg_session_minutes: 30.0,
            support_tickets: 1,
            billing_issues_count: 0,
            is_churned: true,
            cancellation_date: NaiveDate::from_ymd_opt(2023, 8, 10),
            cancellation_reason: Some("Too Expensive".to_string()),
            customer_lifetime_days: 92,
        }
    }

    fn codes(record: &CustomerRecord) -> Vec<String> {
        check_record(record).into_iter().map(|v| v.code).collect()
    }

    #[test]
    fn consistent_churned_row_passes() {
        assert!(check_record(&record()).is_empty());
    }

    #[test]
    fn cancellation_before_join_is_flagged() {
        let mut row = record();
        row.cancellation_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        assert_eq!(codes(&row), vec!["cancellation_before_join"]);
    }

    #[test]
    fn churn_flag_and_dates_must_agree() {
        let mut row = record();
        row.cancellation_date = None;
        assert_eq!(codes(&row), vec!["churn_without_cancellation"]);

        let mut row = record();
        row.is_churned = false;
        assert_eq!(
            codes(&row),
            vec!["cancellation_without_churn", "reason_churn_mismatch"]
        );
    }

    #[test]
    fn schema_ranges_are_enforced() {
        let mut row = record();
        row.age = 101;
        row.plan_name = "Gold".to_string();
        row.plan_price = 0.0;
        assert_eq!(
            codes(&row),
            vec!["age_out_of_range", "unknown_plan", "non_positive_price"]
        );
    }
}
