//! Normalized load tables for the relational store: plan lookup, customers,
//! subscriptions (customer x plan x date range) and usage metrics.

use std::path::Path;

use serde::Serialize;

use churnlab_core::{CustomerRecord, PlanCatalog, format_date, to_csv_bytes, write_bytes_atomic};

use crate::errors::CleanError;

pub const TABLES_DIR: &str = "tables";

const PLAN_COLUMNS: [&str; 4] = ["plan_id", "plan_name", "price", "features"];
const CUSTOMER_COLUMNS: [&str; 9] = [
    "customer_id",
    "age",
    "age_group",
    "region",
    "payment_method",
    "join_date",
    "is_churned",
    "cancellation_date",
    "cancellation_reason",
];
const SUBSCRIPTION_COLUMNS: [&str; 7] = [
    "subscription_id",
    "customer_id",
    "plan_id",
    "start_date",
    "end_date",
    "monthly_price",
    "status",
];
const USAGE_COLUMNS: [&str; 8] = [
    "usage_id",
    "customer_id",
    "avg_monthly_logins",
    "avg_session_minutes",
    "support_tickets",
    "billing_issues_count",
    "tenure_months",
    "customer_lifetime_days",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerRow {
    pub customer_id: u64,
    pub age: u32,
    pub age_group: String,
    pub region: String,
    pub payment_method: String,
    pub join_date: String,
    pub is_churned: u8,
    pub cancellation_date: Option<String>,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionRow {
    pub subscription_id: u64,
    pub customer_id: u64,
    pub plan_id: u32,
    pub start_date: String,
    /// Empty while the subscription is active.
    pub end_date: Option<String>,
    pub monthly_price: f64,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageRow {
    pub usage_id: u64,
    pub customer_id: u64,
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    pub support_tickets: u32,
    pub billing_issues_count: u32,
    pub tenure_months: i64,
    pub customer_lifetime_days: i64,
}

/// Clean records split into the store's tables. Every customer has exactly
/// one subscription and one usage row.
#[derive(Debug, Clone, Default)]
pub struct LoadTables {
    pub customers: Vec<CustomerRow>,
    pub subscriptions: Vec<SubscriptionRow>,
    pub usage: Vec<UsageRow>,
}

pub fn build_tables(records: &[CustomerRecord], catalog: &PlanCatalog) -> LoadTables {
    let mut tables = LoadTables::default();
    for record in records {
        let Some(plan) = catalog.plan(&record.plan_name) else {
            continue;
        };
        tables.customers.push(CustomerRow {
            customer_id: record.customer_id,
            age: record.age,
            age_group: record.age_group.clone(),
            region: record.region.clone(),
            payment_method: record.payment_method.clone(),
            join_date: format_date(record.join_date),
            is_churned: u8::from(record.is_churned),
            cancellation_date: record.cancellation_date.map(format_date),
            cancellation_reason: record.cancellation_reason.clone(),
        });
        tables.subscriptions.push(SubscriptionRow {
            subscription_id: record.customer_id,
            customer_id: record.customer_id,
            plan_id: plan.plan_id(),
            start_date: format_date(record.join_date),
            end_date: record.cancellation_date.map(format_date),
            monthly_price: record.plan_price,
            status: if record.is_churned {
                "cancelled"
            } else {
                "active"
            },
        });
        tables.usage.push(UsageRow {
            usage_id: record.customer_id,
            customer_id: record.customer_id,
            avg_monthly_logins: record.avg_monthly_logins,
            avg_session_minutes: record.avg_session_minutes,
            support_tickets: record.support_tickets,
            billing_issues_count: record.billing_issues_count,
            tenure_months: record.tenure_months,
            customer_lifetime_days: record.customer_lifetime_days,
        });
    }
    tables
}

/// Write the four load tables into `dir`.
pub fn write_tables(
    dir: &Path,
    records: &[CustomerRecord],
    catalog: &PlanCatalog,
) -> Result<LoadTables, CleanError> {
    let tables = build_tables(records, catalog);
    write_bytes_atomic(
        &dir.join("plans.csv"),
        &to_csv_bytes(&PLAN_COLUMNS, &catalog.entries())?,
    )?;
    write_bytes_atomic(
        &dir.join("customers.csv"),
        &to_csv_bytes(&CUSTOMER_COLUMNS, &tables.customers)?,
    )?;
    write_bytes_atomic(
        &dir.join("subscriptions.csv"),
        &to_csv_bytes(&SUBSCRIPTION_COLUMNS, &tables.subscriptions)?,
    )?;
    write_bytes_atomic(
        &dir.join("usage_metrics.csv"),
        &to_csv_bytes(&USAGE_COLUMNS, &tables.usage)?,
    )?;
    Ok(tables)
}
