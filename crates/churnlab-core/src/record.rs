use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{AgeGroup, PlanTier};

/// Canonical date representation for every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Column order shared by the raw and clean customer artifacts.
pub const CUSTOMER_COLUMNS: [&str; 17] = [
    "customer_id",
    "age",
    "age_group",
    "region",
    "plan_name",
    "plan_price",
    "payment_method",
    "join_date",
    "tenure_months",
    "avg_monthly_logins",
    "avg_session_minutes",
    "support_tickets",
    "billing_issues_count",
    "is_churned",
    "cancellation_date",
    "cancellation_reason",
    "customer_lifetime_days",
];

/// Customer row as it appears in the raw artifact.
///
/// Fields targeted by defect injection are kept as text (or optional text) so
/// that nulls, casing drift, and foreign date formats survive a CSV round
/// trip untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCustomer {
    pub customer_id: u64,
    pub age: u32,
    pub age_group: String,
    pub region: Option<String>,
    pub plan_name: String,
    pub plan_price: Option<String>,
    pub payment_method: String,
    pub join_date: Option<String>,
    pub tenure_months: i64,
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    pub support_tickets: u32,
    pub billing_issues_count: u32,
    #[serde(with = "flag")]
    pub is_churned: bool,
    pub cancellation_date: Option<String>,
    pub cancellation_reason: Option<String>,
    pub customer_lifetime_days: i64,
}

impl RawCustomer {
    /// Textual identity of the whole row; equal keys mean byte-identical rows.
    pub fn row_key(&self) -> String {
        let fields = [
            self.customer_id.to_string(),
            self.age.to_string(),
            self.age_group.clone(),
            opt_text(&self.region),
            self.plan_name.clone(),
            opt_text(&self.plan_price),
            self.payment_method.clone(),
            opt_text(&self.join_date),
            self.tenure_months.to_string(),
            self.avg_monthly_logins.to_string(),
            self.avg_session_minutes.to_string(),
            self.support_tickets.to_string(),
            self.billing_issues_count.to_string(),
            u8::from(self.is_churned).to_string(),
            opt_text(&self.cancellation_date),
            opt_text(&self.cancellation_reason),
            self.customer_lifetime_days.to_string(),
        ];
        fields.join("\u{1f}")
    }
}

fn opt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Canonical, constraint-satisfying customer row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: u64,
    pub age: u32,
    pub age_group: String,
    pub region: String,
    pub plan_name: String,
    pub plan_price: f64,
    pub payment_method: String,
    pub join_date: NaiveDate,
    pub tenure_months: i64,
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    pub support_tickets: u32,
    pub billing_issues_count: u32,
    #[serde(with = "flag")]
    pub is_churned: bool,
    pub cancellation_date: Option<NaiveDate>,
    pub cancellation_reason: Option<String>,
    pub customer_lifetime_days: i64,
}

impl CustomerRecord {
    pub fn plan(&self) -> Option<PlanTier> {
        PlanTier::from_name(&self.plan_name)
    }

    pub fn age_bucket(&self) -> Option<AgeGroup> {
        AgeGroup::from_age(self.age)
    }
}

impl From<&CustomerRecord> for RawCustomer {
    fn from(record: &CustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id,
            age: record.age,
            age_group: record.age_group.clone(),
            region: Some(record.region.clone()),
            plan_name: record.plan_name.clone(),
            plan_price: Some(format!("{:.2}", record.plan_price)),
            payment_method: record.payment_method.clone(),
            join_date: Some(format_date(record.join_date)),
            tenure_months: record.tenure_months,
            avg_monthly_logins: record.avg_monthly_logins,
            avg_session_minutes: record.avg_session_minutes,
            support_tickets: record.support_tickets,
            billing_issues_count: record.billing_issues_count,
            is_churned: record.is_churned,
            cancellation_date: record.cancellation_date.map(format_date),
            cancellation_reason: record.cancellation_reason.clone(),
            customer_lifetime_days: record.customer_lifetime_days,
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Derived duration of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub days: i64,
    pub months: i64,
}

/// Lifetime from `join_date` to the cancellation date, or to `as_of` for
/// customers that are still active. Months are whole 30-day periods.
pub fn lifetime(join_date: NaiveDate, cancellation_date: Option<NaiveDate>, as_of: NaiveDate) -> Lifetime {
    let end = cancellation_date.unwrap_or(as_of);
    let days = (end - join_date).num_days();
    Lifetime {
        days,
        months: days.div_euclid(30),
    }
}

/// Serde adapter encoding booleans as `0`/`1`.
pub(crate) mod flag {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            other => Err(D::Error::custom(format!("invalid churn flag '{other}'"))),
        }
    }
}
