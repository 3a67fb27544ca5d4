use chrono::NaiveDate;

use churnlab_core::{
    AgeGroup, ConstraintViolation, CustomerRecord, DataIssue, PlanTier, check_record, lifetime,
};

use crate::stages::parse::ParsedCustomer;

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub record: CustomerRecord,
    /// Any of `age_group`, `tenure_months`, `customer_lifetime_days` changed
    /// on recompute.
    pub derived_changed: bool,
}

/// Build the canonical record, recomputing derived fields against `as_of`,
/// and check every row constraint. Violating rows are rejected with one issue
/// per broken constraint; nothing is corrected here.
pub fn validate_row(customer: ParsedCustomer, as_of: NaiveDate) -> Result<Validated, Vec<DataIssue>> {
    let id = customer.customer_id;
    let (Some(join_date), Some(plan_price)) = (customer.join_date, customer.plan_price) else {
        let mut issues = Vec::new();
        if customer.join_date.is_none() {
            issues.push(DataIssue::violation(
                id,
                "missing_join_date",
                "join_date is missing or was unparseable".to_string(),
            ));
        }
        if PlanTier::from_name(&customer.plan_name).is_none() {
            issues.push(DataIssue::violation(
                id,
                "unknown_plan",
                format!("plan '{}' is not in the plan catalog", customer.plan_name),
            ));
        } else if customer.plan_price.is_none() {
            issues.push(DataIssue::violation(
                id,
                "missing_plan_price",
                "plan_price is missing".to_string(),
            ));
        }
        return Err(issues);
    };

    let age_group = AgeGroup::from_age(customer.age)
        .map(|group| group.label().to_string())
        .unwrap_or_else(|| customer.age_group.clone());
    let life = lifetime(join_date, customer.cancellation_date, as_of);
    let derived_changed = age_group != customer.age_group
        || life.months != customer.tenure_months
        || life.days != customer.customer_lifetime_days;

    let record = CustomerRecord {
        customer_id: customer.customer_id,
        age: customer.age,
        age_group,
        region: customer.region.unwrap_or_default(),
        plan_name: customer.plan_name,
        plan_price,
        payment_method: customer.payment_method,
        join_date,
        tenure_months: life.months,
        avg_monthly_logins: customer.avg_monthly_logins,
        avg_session_minutes: customer.avg_session_minutes,
        support_tickets: customer.support_tickets,
        billing_issues_count: customer.billing_issues_count,
        is_churned: customer.is_churned,
        cancellation_date: customer.cancellation_date,
        cancellation_reason: customer.cancellation_reason,
        customer_lifetime_days: life.days,
    };

    let mut violations = check_record(&record);
    if join_date > as_of {
        violations.push(ConstraintViolation {
            code: "join_after_as_of".to_string(),
            message: format!("join_date {join_date} is after the reference date {as_of}"),
        });
    }
    if violations.is_empty() {
        Ok(Validated {
            record,
            derived_changed,
        })
    } else {
        Err(violations
            .into_iter()
            .map(|violation| DataIssue::violation(id, &violation.code, violation.message))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use churnlab_core::default_as_of;

    use super::*;
    use crate::model::CleanOptions;
    use crate::stages::parse::parse_row;
    use crate::stages::test_rows::raw;

    fn parsed(row: churnlab_core::RawCustomer) -> ParsedCustomer {
        parse_row(row, &CleanOptions::default().date_formats).customer
    }

    fn codes(result: Result<Validated, Vec<DataIssue>>) -> Vec<String> {
        result.unwrap_err().into_iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn consistent_rows_pass_with_matching_derived_fields() {
        for id in [1, 2] {
            let validated = validate_row(parsed(raw(id)), default_as_of()).unwrap();
            assert!(!validated.derived_changed, "row {id}");
        }
    }

    #[test]
    fn cancellation_before_join_is_rejected_not_fixed() {
        let mut row = raw(2);
        row.cancellation_date = Some("2023-01-01".to_string());
        assert_eq!(
            codes(validate_row(parsed(row), default_as_of())),
            vec!["cancellation_before_join"]
        );
    }

    #[test]
    fn join_after_reference_date_is_rejected() {
        let mut row = raw(1);
        row.join_date = Some("2025-03-01".to_string());
        assert_eq!(
            codes(validate_row(parsed(row), default_as_of())),
            vec!["join_after_as_of"]
        );

        let mut row = raw(1);
        row.join_date = Some("2024-09-30".to_string());
        let validated = validate_row(parsed(row), default_as_of()).unwrap();
        assert_eq!(validated.record.customer_lifetime_days, 0);
        assert_eq!(validated.record.tenure_months, 0);
    }

    #[test]
    fn missing_join_date_is_a_violation() {
        let mut row = raw(1);
        row.join_date = None;
        assert_eq!(
            codes(validate_row(parsed(row), default_as_of())),
            vec!["missing_join_date"]
        );
    }

    #[test]
    fn unknown_plan_without_price_is_rejected() {
        let mut row = raw(1);
        row.plan_name = "Gold".to_string();
        row.plan_price = None;
        assert_eq!(
            codes(validate_row(parsed(row), default_as_of())),
            vec!["unknown_plan"]
        );
    }

    #[test]
    fn stale_derived_fields_are_recomputed() {
        let mut row = raw(1);
        row.age_group = "35-44".to_string();
        row.customer_lifetime_days = 1;
        let validated = validate_row(parsed(row), default_as_of()).unwrap();
        assert!(validated.derived_changed);
        assert_eq!(validated.record.age_group, "25-34");
        assert_eq!(validated.record.customer_lifetime_days, 509);
        assert_eq!(validated.record.tenure_months, 16);
    }
}
