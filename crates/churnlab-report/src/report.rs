use churnlab_clean::CleaningSummary;

use crate::metrics::{ChurnMetrics, SegmentRate};

const RULE: &str = "=============================================================";

/// Render the deterministic plain-text findings report.
pub fn render_report(summary: Option<&CleaningSummary>, metrics: &ChurnMetrics) -> String {
    let mut lines = Vec::new();
    let totals = &metrics.totals;

    lines.push(RULE.to_string());
    lines.push("CUSTOMER CHURN ANALYSIS - FINDINGS REPORT".to_string());
    lines.push(RULE.to_string());
    lines.push(format!("Dataset: {} customers", totals.customers));
    lines.push(String::new());

    if let Some(summary) = summary {
        push_heading(&mut lines, "DATA CLEANING");
        lines.push(format!("Raw rows                    : {}", summary.rows_in));
        lines.push(format!(
            "Duplicates removed          : {}",
            summary.duplicates_removed
        ));
        lines.push(format!(
            "Text values normalized      : {}",
            summary.text_normalized.values().sum::<u64>()
        ));
        lines.push(format!(
            "Dates normalized            : {}",
            summary.dates_normalized.values().sum::<u64>()
        ));
        lines.push(format!(
            "Unparseable values nulled   : {}",
            summary.unparseable_total()
        ));
        lines.push(format!("Prices filled               : {}", summary.prices_filled));
        lines.push(format!(
            "Prices corrected            : {}",
            summary.prices_corrected
        ));
        lines.push(format!(
            "Regions set to sentinel     : {}",
            summary.regions_filled + summary.regions_unrecognized
        ));
        lines.push(format!(
            "Rows rejected (invariants)  : {}",
            summary.invariant_violations
        ));
        for (code, count) in &summary.violations_by_code {
            lines.push(format!("  - {code}: {count}"));
        }
        lines.push(format!("Clean rows                  : {}", summary.rows_out));
        lines.push(String::new());
    }

    push_heading(&mut lines, "KEY METRICS");
    lines.push(format!(
        "Overall Churn Rate          : {}",
        percent(totals.churn_rate)
    ));
    lines.push(format!("Total Churned Customers     : {}", totals.churned));
    lines.push(format!("Active Customers            : {}", totals.active));
    lines.push(format!("Monthly Recurring Revenue   : {:.2}", totals.mrr));
    lines.push(format!(
        "Avg Tenure                  : {:.1} months",
        totals.avg_tenure_months
    ));
    lines.push(format!(
        "Avg Logins/Month            : {:.1}",
        totals.avg_monthly_logins
    ));
    lines.push(format!(
        "Avg Session Time            : {:.1} min",
        totals.avg_session_minutes
    ));
    if let Some(days) = totals.avg_churned_lifetime_days {
        lines.push(format!(
            "Avg Lifetime (churned)      : {:.0} days ({:.1} months)",
            days,
            days / 30.0
        ));
    }
    lines.push(String::new());

    push_heading(&mut lines, "TOP CHURN DRIVERS (by correlation)");
    if metrics.top_factors.is_empty() {
        lines.push("  none: no feature varies with churn".to_string());
    }
    for (rank, factor) in metrics.top_factors.iter().enumerate() {
        if let Some(r) = factor.r {
            let direction = if r > 0.0 { "POSITIVE" } else { "NEGATIVE" };
            lines.push(format!(
                "  {}. {} (r={:+.4}, {} correlation)",
                rank + 1,
                factor.feature,
                r,
                direction
            ));
        }
    }
    lines.push(String::new());

    push_heading(&mut lines, "SEGMENT FINDINGS");
    let segments = &metrics.segments;
    push_segments(&mut lines, "Churn by Plan", &segments.by_plan);
    push_segments(&mut lines, "Churn by Region", &segments.by_region);
    push_segments(&mut lines, "Churn by Age Group", &segments.by_age_group);
    push_segments(&mut lines, "Churn by Engagement", &segments.by_engagement);
    push_segments(&mut lines, "Churn by Tenure", &segments.by_tenure);
    push_segments(&mut lines, "Churn by Billing Issues", &segments.by_billing);
    lines.push(RULE.to_string());

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn push_heading(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
}

fn push_segments(lines: &mut Vec<String>, title: &str, segments: &[SegmentRate]) {
    lines.push(format!("{title}:"));
    for segment in segments {
        lines.push(format!(
            "  {:<20} {:>6}  ({} of {})",
            segment.segment,
            percent(segment.churn_rate),
            segment.churned,
            segment.customers
        ));
    }
    lines.push(String::new());
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
