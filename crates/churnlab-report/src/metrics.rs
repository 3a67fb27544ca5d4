use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use churnlab_core::{
    AgeGroup, BillingTier, CustomerRecord, EngagementTier, PlanTier, Region, TenureTier,
};

/// Metrics contract version for `churn_metrics.json`.
pub const METRICS_VERSION: &str = "0.1";

/// Numeric features correlated against `is_churned`.
pub const CORRELATED_FEATURES: [&str; 7] = [
    "plan_price",
    "tenure_months",
    "avg_monthly_logins",
    "avg_session_minutes",
    "support_tickets",
    "billing_issues_count",
    "customer_lifetime_days",
];

/// Machine-readable churn statistics over a clean dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnMetrics {
    pub metrics_version: String,
    pub totals: Totals,
    pub segments: Segments,
    /// Sorted by absolute correlation, strongest first.
    pub correlations: Vec<FeatureCorrelation>,
    pub top_factors: Vec<FeatureCorrelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Totals {
    pub customers: u64,
    pub churned: u64,
    pub active: u64,
    pub churn_rate: f64,
    pub avg_tenure_months: f64,
    pub avg_monthly_logins: f64,
    pub avg_session_minutes: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_churned_lifetime_days: Option<f64>,
    /// Sum of active customers' monthly plan prices.
    pub mrr: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segments {
    pub by_plan: Vec<SegmentRate>,
    pub by_region: Vec<SegmentRate>,
    pub by_age_group: Vec<SegmentRate>,
    pub by_engagement: Vec<SegmentRate>,
    pub by_tenure: Vec<SegmentRate>,
    pub by_billing: Vec<SegmentRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentRate {
    pub segment: String,
    pub customers: u64,
    pub churned: u64,
    pub churn_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCorrelation {
    pub feature: String,
    /// `None` when the feature or the churn flag is constant.
    pub r: Option<f64>,
}

pub fn compute_metrics(records: &[CustomerRecord], top_factors: usize) -> ChurnMetrics {
    let correlations = correlations(records);
    let top = correlations
        .iter()
        .filter(|c| c.r.is_some())
        .take(top_factors)
        .cloned()
        .collect();

    ChurnMetrics {
        metrics_version: METRICS_VERSION.to_string(),
        totals: totals(records),
        segments: Segments {
            by_plan: segment_rates(records, |r| {
                let rank = r.plan().map(PlanTier::plan_id).unwrap_or(u32::MAX);
                (rank as usize, r.plan_name.clone())
            }),
            by_region: segment_rates(records, |r| {
                let rank = Region::from_name(&r.region)
                    .map(|region| region as usize)
                    .unwrap_or(usize::MAX);
                (rank, r.region.clone())
            }),
            by_age_group: segment_rates(records, |r| match r.age_bucket() {
                Some(group) => (group as usize, group.label().to_string()),
                None => (usize::MAX, r.age_group.clone()),
            }),
            by_engagement: segment_rates(records, |r| {
                let tier = EngagementTier::from_logins(r.avg_monthly_logins);
                (tier as usize, tier.label().to_string())
            }),
            by_tenure: segment_rates(records, |r| {
                let tier = TenureTier::from_months(r.tenure_months);
                (tier as usize, tier.label().to_string())
            }),
            by_billing: segment_rates(records, |r| {
                let tier = BillingTier::from_count(r.billing_issues_count);
                (tier as usize, tier.label().to_string())
            }),
        },
        correlations,
        top_factors: top,
    }
}

fn totals(records: &[CustomerRecord]) -> Totals {
    let customers = records.len() as u64;
    let churned_records: Vec<&CustomerRecord> = records.iter().filter(|r| r.is_churned).collect();
    let churned = churned_records.len() as u64;
    let mrr = records
        .iter()
        .filter(|r| !r.is_churned)
        .map(|r| r.plan_price)
        .sum::<f64>();

    Totals {
        customers,
        churned,
        active: customers - churned,
        churn_rate: ratio(churned, customers),
        avg_tenure_months: mean(records.iter().map(|r| r.tenure_months as f64)).unwrap_or(0.0),
        avg_monthly_logins: mean(records.iter().map(|r| r.avg_monthly_logins)).unwrap_or(0.0),
        avg_session_minutes: mean(records.iter().map(|r| r.avg_session_minutes)).unwrap_or(0.0),
        avg_churned_lifetime_days: mean(
            churned_records
                .iter()
                .map(|r| r.customer_lifetime_days as f64),
        ),
        mrr: (mrr * 100.0).round() / 100.0,
    }
}

/// Churn rate per segment, ordered by the segment's rank then label.
fn segment_rates<F>(records: &[CustomerRecord], key: F) -> Vec<SegmentRate>
where
    F: Fn(&CustomerRecord) -> (usize, String),
{
    let mut counts: BTreeMap<(usize, String), (u64, u64)> = BTreeMap::new();
    for record in records {
        let entry = counts.entry(key(record)).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u64::from(record.is_churned);
    }
    counts
        .into_iter()
        .map(|((_, segment), (customers, churned))| SegmentRate {
            segment,
            customers,
            churned,
            churn_rate: ratio(churned, customers),
        })
        .collect()
}

fn correlations(records: &[CustomerRecord]) -> Vec<FeatureCorrelation> {
    let churn: Vec<f64> = records
        .iter()
        .map(|r| if r.is_churned { 1.0 } else { 0.0 })
        .collect();
    let mut out: Vec<FeatureCorrelation> = CORRELATED_FEATURES
        .iter()
        .map(|feature| {
            let values: Vec<f64> = records.iter().map(|r| feature_value(r, feature)).collect();
            FeatureCorrelation {
                feature: feature.to_string(),
                r: pearson(&values, &churn),
            }
        })
        .collect();
    out.sort_by(|a, b| match (a.r, b.r) {
        (Some(x), Some(y)) => y
            .abs()
            .partial_cmp(&x.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.feature.cmp(&b.feature)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.feature.cmp(&b.feature),
    });
    out
}

fn feature_value(record: &CustomerRecord, feature: &str) -> f64 {
    match feature {
        "plan_price" => record.plan_price,
        "tenure_months" => record.tenure_months as f64,
        "avg_monthly_logins" => record.avg_monthly_logins,
        "avg_session_minutes" => record.avg_session_minutes,
        "support_tickets" => f64::from(record.support_tickets),
        "billing_issues_count" => f64::from(record.billing_issues_count),
        "customer_lifetime_days" => record.customer_lifetime_days as f64,
        _ => 0.0,
    }
}

/// Pearson correlation coefficient. With a 0/1 series this is the
/// point-biserial correlation.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs.iter().copied())?;
    let mean_y = mean(ys.iter().copied())?;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_u64), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(id: u64, plan: PlanTier, logins: f64, churned: bool) -> CustomerRecord {
        CustomerRecord {
            customer_id: id,
            age: 30,
            age_group: "25-34".to_string(),
            region: if id % 2 == 0 { "West" } else { "Unknown" }.to_string(),
            plan_name: plan.name().to_string(),
            plan_price: plan.price(),
            payment_method: "PayPal".to_string(),
            join_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            tenure_months: 10,
            avg_monthly_logins: logins,
            avg_session_minutes: 30.0,
            support_tickets: 0,
            billing_issues_count: u32::from(churned),
            is_churned: churned,
            cancellation_date: churned.then(|| NaiveDate::from_ymd_opt(2023, 11, 1).unwrap()),
            cancellation_reason: churned.then(|| "Too Expensive".to_string()),
            customer_lifetime_days: 304,
        }
    }

    #[test]
    fn pearson_handles_perfect_and_degenerate_series() {
        let r = pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[1.0, 2.0, 3.0], &[1.0, 0.0, 0.0]).unwrap();
        assert!(r < 0.0);
        assert_eq!(pearson(&[1.0, 1.0], &[0.0, 1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn totals_count_mrr_from_active_customers_only() {
        let records = vec![
            record(1, PlanTier::Basic, 20.0, false),
            record(2, PlanTier::Premium, 1.0, true),
            record(3, PlanTier::Standard, 12.0, false),
        ];
        let metrics = compute_metrics(&records, 3);
        assert_eq!(metrics.totals.customers, 3);
        assert_eq!(metrics.totals.churned, 1);
        assert_eq!(metrics.totals.mrr, 25.98);
        assert_eq!(metrics.totals.avg_churned_lifetime_days, Some(304.0));
    }

    #[test]
    fn segments_follow_catalog_order() {
        let records = vec![
            record(1, PlanTier::Premium, 1.0, true),
            record(2, PlanTier::Basic, 20.0, false),
            record(3, PlanTier::Basic, 2.0, true),
        ];
        let metrics = compute_metrics(&records, 3);
        let plans: Vec<(&str, u64)> = metrics
            .segments
            .by_plan
            .iter()
            .map(|s| (s.segment.as_str(), s.customers))
            .collect();
        assert_eq!(plans, vec![("Basic", 2), ("Premium", 1)]);

        let regions: Vec<&str> = metrics
            .segments
            .by_region
            .iter()
            .map(|s| s.segment.as_str())
            .collect();
        assert_eq!(regions, vec!["West", "Unknown"]);

        let very_low = &metrics.segments.by_engagement[0];
        assert_eq!(very_low.segment, "Very Low (<3/mo)");
        assert_eq!(very_low.churn_rate, 1.0);
    }

    #[test]
    fn constant_features_rank_last_and_skip_top_factors() {
        let records = vec![
            record(1, PlanTier::Basic, 20.0, false),
            record(2, PlanTier::Basic, 1.0, true),
            record(3, PlanTier::Basic, 15.0, false),
        ];
        let metrics = compute_metrics(&records, 3);
        let last = metrics.correlations.last().unwrap();
        assert_eq!(last.r, None);
        assert!(metrics.top_factors.iter().all(|f| f.r.is_some()));
        assert_eq!(metrics.top_factors[0].feature, "billing_issues_count");
    }
}
