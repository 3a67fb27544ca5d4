use chrono::{NaiveDate, NaiveDateTime};

use churnlab_core::{DataIssue, RawCustomer, format_date};

use crate::stages::Repaired;

/// Customer row after date and price parsing. Fields still optional here are
/// resolved by the missing-value and validation stages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCustomer {
    pub customer_id: u64,
    pub age: u32,
    pub age_group: String,
    pub region: Option<String>,
    pub plan_name: String,
    pub plan_price: Option<f64>,
    pub payment_method: String,
    pub join_date: Option<NaiveDate>,
    pub tenure_months: i64,
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    pub support_tickets: u32,
    pub billing_issues_count: u32,
    pub is_churned: bool,
    pub cancellation_date: Option<NaiveDate>,
    pub cancellation_reason: Option<String>,
    pub customer_lifetime_days: i64,
}

/// Parse `value` with the first matching format. `applied` is set when the
/// text was not already in canonical form. `None` means no format matched.
pub fn parse_date(value: &str, formats: &[String]) -> Option<Repaired<NaiveDate>> {
    let trimmed = value.trim();
    let date = formats.iter().find_map(|format| {
        NaiveDate::parse_from_str(trimmed, format)
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(trimmed, format)
                    .ok()
                    .map(|dt| dt.date())
            })
    })?;
    if format_date(date) == value {
        Some(Repaired::unchanged(date))
    } else {
        Some(Repaired::changed(date))
    }
}

/// Parse a price, tolerating surrounding whitespace and a leading `$`.
pub fn parse_price(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    digits.parse::<f64>().ok().filter(|price| price.is_finite())
}

/// Outcome of parsing one row.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub customer: ParsedCustomer,
    /// Date fields rewritten into canonical form.
    pub normalized: Vec<&'static str>,
    /// Values nulled because nothing recognized them.
    pub issues: Vec<DataIssue>,
}

pub fn parse_row(row: RawCustomer, formats: &[String]) -> ParsedRow {
    let mut normalized = Vec::new();
    let mut issues = Vec::new();
    let id = row.customer_id;

    let mut date_field = |field: &'static str, value: Option<String>| -> Option<NaiveDate> {
        let text = value?;
        match parse_date(&text, formats) {
            Some(parsed) => {
                if parsed.applied {
                    normalized.push(field);
                }
                Some(parsed.value)
            }
            None => {
                issues.push(DataIssue::unparseable(id, field, &text));
                None
            }
        }
    };
    let join_date = date_field("join_date", row.join_date);
    let cancellation_date = date_field("cancellation_date", row.cancellation_date);

    let plan_price = row.plan_price.and_then(|text| {
        let price = parse_price(&text);
        if price.is_none() {
            issues.push(DataIssue::unparseable(id, "plan_price", &text));
        }
        price
    });

    ParsedRow {
        customer: ParsedCustomer {
            customer_id: row.customer_id,
            age: row.age,
            age_group: row.age_group,
            region: row.region,
            plan_name: row.plan_name,
            plan_price,
            payment_method: row.payment_method,
            join_date,
            tenure_months: row.tenure_months,
            avg_monthly_logins: row.avg_monthly_logins,
            avg_session_minutes: row.avg_session_minutes,
            support_tickets: row.support_tickets,
            billing_issues_count: row.billing_issues_count,
            is_churned: row.is_churned,
            cancellation_date,
            cancellation_reason: row.cancellation_reason,
            customer_lifetime_days: row.customer_lifetime_days,
        },
        normalized,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CleanOptions;
    use crate::stages::test_rows::raw;

    fn formats() -> Vec<String> {
        CleanOptions::default().date_formats
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn recognized_formats_normalize_to_iso() {
        let formats = formats();
        assert_eq!(
            parse_date("2023-05-10", &formats),
            Some(Repaired::unchanged(date(2023, 5, 10)))
        );
        assert_eq!(
            parse_date("05/10/2023", &formats),
            Some(Repaired::changed(date(2023, 5, 10)))
        );
        assert_eq!(
            parse_date("2023/05/10", &formats),
            Some(Repaired::changed(date(2023, 5, 10)))
        );
        assert_eq!(
            parse_date("2023-05-10 13:45:00", &formats),
            Some(Repaired::changed(date(2023, 5, 10)))
        );
    }

    #[test]
    fn unrecognized_dates_are_rejected() {
        let formats = formats();
        for value in ["N/A", "00/00/0000", "2023-13-45", "yesterday", ""] {
            assert_eq!(parse_date(value, &formats), None, "{value}");
        }
    }

    #[test]
    fn date_normalization_is_idempotent() {
        let formats = formats();
        let once = parse_date("05/10/2023", &formats).unwrap().value;
        let twice = parse_date(&format_date(once), &formats).unwrap();
        assert_eq!(twice, Repaired::unchanged(once));
    }

    #[test]
    fn prices_parse_leniently() {
        assert_eq!(parse_price("15.99"), Some(15.99));
        assert_eq!(parse_price(" $9.99 "), Some(9.99));
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price("NaN"), None);
    }

    #[test]
    fn unparseable_values_are_nulled_and_reported() {
        let mut row = raw(2);
        row.join_date = Some("yesterday".to_string());
        row.cancellation_date = Some("09/01/2023".to_string());
        row.plan_price = Some("n/a".to_string());

        let parsed = parse_row(row, &formats());
        assert_eq!(parsed.customer.join_date, None);
        assert_eq!(parsed.customer.cancellation_date, Some(date(2023, 9, 1)));
        assert_eq!(parsed.customer.plan_price, None);
        assert_eq!(parsed.normalized, vec!["cancellation_date"]);

        let codes: Vec<&str> = parsed.issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["unparseable_join_date", "unparseable_plan_price"]);
    }
}
