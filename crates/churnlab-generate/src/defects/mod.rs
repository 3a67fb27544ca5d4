//! Defect injection.
//!
//! Each field defect is an independent [`Defect`] that draws its own subset of
//! rows from a dedicated seeded stream, reads the pristine row, and writes a
//! single field. Defects writing the same field are applied by ascending
//! precedence, so the combined effect does not depend on registration order.
//! Duplicate rows are appended last as verbatim copies of the corrupted rows.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rand::seq::index;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use churnlab_core::{DATE_FORMAT, RawCustomer};

use crate::config::DefectConfig;
use crate::sampling::hash_seed;

pub const DUPLICATE_ROWS: &str = "defect.duplicate_rows";

/// A single kind of data corruption applied to one row.
pub trait Defect {
    fn id(&self) -> &'static str;

    /// Later precedence wins when two defects write the same field.
    fn precedence(&self) -> u8 {
        0
    }

    /// Corrupt `row` in place, reading uncorrupted values from `original`.
    /// Returns `false` when the row is not eligible.
    fn apply(&self, row: &mut RawCustomer, original: &RawCustomer, rng: &mut dyn RngCore)
    -> bool;
}

/// Counts of rows actually corrupted, keyed by defect id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefectReport {
    pub applied: BTreeMap<String, u64>,
}

impl DefectReport {
    pub fn count(&self, id: &str) -> u64 {
        self.applied.get(id).copied().unwrap_or(0)
    }

    pub fn duplicates(&self) -> u64 {
        self.count(DUPLICATE_ROWS)
    }
}

/// Defects enabled by a configuration, paired with their row rates.
pub struct DefectSet {
    defects: Vec<(Box<dyn Defect>, f64)>,
    duplicate_rate: f64,
}

impl DefectSet {
    pub fn from_config(config: &DefectConfig) -> Self {
        let defects: Vec<(Box<dyn Defect>, f64)> = vec![
            (Box::new(NullPrice), config.null_price_rate),
            (Box::new(NullRegion), config.null_region_rate),
            (Box::new(RecasePlanName), config.recase_plan_rate),
            (
                Box::new(AlternateDateFormat {
                    format: config.alternate_date_format.clone(),
                }),
                config.alternate_date_rate,
            ),
            (Box::new(UnparseableJoinDate), config.unparseable_date_rate),
            (
                Box::new(CancellationBeforeJoin),
                config.inverted_cancellation_rate,
            ),
        ];
        Self {
            defects,
            duplicate_rate: config.duplicate_rate,
        }
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.defects.iter().map(|(defect, _)| defect.id()).collect()
    }

    /// Corrupt `rows` and append duplicates. Deterministic for a given seed.
    pub fn inject(&self, mut rows: Vec<RawCustomer>, seed: u64) -> (Vec<RawCustomer>, DefectReport) {
        let mut report = DefectReport::default();
        let base_len = rows.len();
        let pristine = rows.clone();

        let mut ordered: Vec<&(Box<dyn Defect>, f64)> = self.defects.iter().collect();
        ordered.sort_by_key(|(defect, _)| defect.precedence());

        for (defect, rate) in ordered {
            let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, defect.id()));
            let mut applied = 0_u64;
            for idx in select_rows(base_len, *rate, &mut rng) {
                if defect.apply(&mut rows[idx], &pristine[idx], &mut rng) {
                    applied += 1;
                }
            }
            report.applied.insert(defect.id().to_string(), applied);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(hash_seed(seed, DUPLICATE_ROWS));
        let duplicates: Vec<RawCustomer> = select_rows(base_len, self.duplicate_rate, &mut rng)
            .into_iter()
            .map(|idx| rows[idx].clone())
            .collect();
        report
            .applied
            .insert(DUPLICATE_ROWS.to_string(), duplicates.len() as u64);
        rows.extend(duplicates);

        (rows, report)
    }
}

/// Pick `floor(len * rate)` distinct row indices, in ascending order.
pub fn select_rows<R: Rng + ?Sized>(len: usize, rate: f64, rng: &mut R) -> Vec<usize> {
    let amount = ((len as f64) * rate).floor() as usize;
    let amount = amount.min(len);
    if amount == 0 {
        return Vec::new();
    }
    let mut picked = index::sample(rng, len, amount).into_vec();
    picked.sort_unstable();
    picked
}

struct NullPrice;

impl Defect for NullPrice {
    fn id(&self) -> &'static str {
        "defect.null_price"
    }

    fn apply(&self, row: &mut RawCustomer, _original: &RawCustomer, _rng: &mut dyn RngCore) -> bool {
        row.plan_price.take().is_some()
    }
}

struct NullRegion;

impl Defect for NullRegion {
    fn id(&self) -> &'static str {
        "defect.null_region"
    }

    fn apply(&self, row: &mut RawCustomer, _original: &RawCustomer, _rng: &mut dyn RngCore) -> bool {
        row.region.take().is_some()
    }
}

/// Casing drift seen in hand-entered categorical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    Lower,
    Upper,
    Mixed,
}

impl Casing {
    pub fn apply(self, value: &str) -> String {
        match self {
            Casing::Lower => value.to_lowercase(),
            Casing::Upper => value.to_uppercase(),
            Casing::Mixed => value
                .chars()
                .enumerate()
                .map(|(idx, ch)| {
                    if idx % 2 == 0 {
                        ch.to_ascii_lowercase()
                    } else {
                        ch.to_ascii_uppercase()
                    }
                })
                .collect(),
        }
    }
}

struct RecasePlanName;

impl Defect for RecasePlanName {
    fn id(&self) -> &'static str {
        "defect.recase_plan_name"
    }

    fn apply(&self, row: &mut RawCustomer, original: &RawCustomer, rng: &mut dyn RngCore) -> bool {
        let casing = match rng.random_range(0..3) {
            0 => Casing::Lower,
            1 => Casing::Upper,
            _ => Casing::Mixed,
        };
        let recased = casing.apply(&original.plan_name);
        let changed = recased != row.plan_name;
        row.plan_name = recased;
        changed
    }
}

struct AlternateDateFormat {
    format: String,
}

impl Defect for AlternateDateFormat {
    fn id(&self) -> &'static str {
        "defect.alternate_date_format"
    }

    fn apply(&self, row: &mut RawCustomer, original: &RawCustomer, _rng: &mut dyn RngCore) -> bool {
        let Some(date) = original
            .join_date
            .as_deref()
            .and_then(|value| NaiveDate::parse_from_str(value, DATE_FORMAT).ok())
        else {
            return false;
        };
        row.join_date = Some(date.format(&self.format).to_string());
        true
    }
}

const GARBAGE_DATES: [&str; 4] = ["N/A", "00/00/0000", "2023-13-45", "yesterday"];

struct UnparseableJoinDate;

impl Defect for UnparseableJoinDate {
    fn id(&self) -> &'static str {
        "defect.unparseable_join_date"
    }

    fn precedence(&self) -> u8 {
        1
    }

    fn apply(&self, row: &mut RawCustomer, _original: &RawCustomer, rng: &mut dyn RngCore) -> bool {
        let value = GARBAGE_DATES[rng.random_range(0..GARBAGE_DATES.len())];
        row.join_date = Some(value.to_string());
        true
    }
}

struct CancellationBeforeJoin;

impl Defect for CancellationBeforeJoin {
    fn id(&self) -> &'static str {
        "defect.cancellation_before_join"
    }

    fn apply(&self, row: &mut RawCustomer, original: &RawCustomer, rng: &mut dyn RngCore) -> bool {
        if !original.is_churned || original.cancellation_date.is_none() {
            return false;
        }
        let Some(join) = original
            .join_date
            .as_deref()
            .and_then(|value| NaiveDate::parse_from_str(value, DATE_FORMAT).ok())
        else {
            return false;
        };
        let days_before = rng.random_range(1..=365);
        let cancelled = join - Duration::days(days_before);
        row.cancellation_date = Some(cancelled.format(DATE_FORMAT).to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u64) -> RawCustomer {
        RawCustomer {
            customer_id: id,
            age: 30,
            age_group: "25-34".to_string(),
            region: Some("West".to_string()),
            plan_name: "Standard".to_string(),
            plan_price: Some("15.99".to_string()),
            payment_method: "PayPal".to_string(),
            join_date: Some("2023-05-10".to_string()),
            tenure_months: 16,
            avg_monthly_logins: 10.0,
            avg_session_minutes: 40.0,
            support_tickets: 0,
            billing_issues_count: 0,
            is_churned: id % 2 == 0,
            cancellation_date: (id % 2 == 0).then(|| "2023-09-01".to_string()),
            cancellation_reason: (id % 2 == 0).then(|| "Too Expensive".to_string()),
            customer_lifetime_days: 114,
        }
    }

    fn rows(n: u64) -> Vec<RawCustomer> {
        (1..=n).map(raw).collect()
    }

    #[test]
    fn select_rows_uses_floor_of_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = select_rows(105, 0.05, &mut rng);
        assert_eq!(picked.len(), 5);
        assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(select_rows(10, 0.0, &mut rng).is_empty());
        assert_eq!(select_rows(10, 1.0, &mut rng).len(), 10);
    }

    #[test]
    fn casing_variants() {
        assert_eq!(Casing::Lower.apply("Premium"), "premium");
        assert_eq!(Casing::Upper.apply("Premium"), "PREMIUM");
        assert_eq!(Casing::Mixed.apply("Basic"), "bAsIc");
    }

    #[test]
    fn alternate_format_rewrites_iso_join_date() {
        let defect = AlternateDateFormat {
            format: "%m/%d/%Y".to_string(),
        };
        let original = raw(1);
        let mut row = original.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(defect.apply(&mut row, &original, &mut rng));
        assert_eq!(row.join_date.as_deref(), Some("05/10/2023"));
    }

    #[test]
    fn inverted_cancellation_only_hits_churned_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut active = raw(1);
        assert!(!CancellationBeforeJoin.apply(&mut active, &raw(1), &mut rng));

        let mut churned = raw(2);
        assert!(CancellationBeforeJoin.apply(&mut churned, &raw(2), &mut rng));
        let cancelled = churned.cancellation_date.unwrap();
        assert!(cancelled.as_str() < "2023-05-10");
    }

    #[test]
    fn duplicates_are_verbatim_copies_appended_last() {
        let config = DefectConfig {
            duplicate_rate: 0.1,
            null_region_rate: 0.5,
            ..DefectConfig::none()
        };
        let (out, report) = DefectSet::from_config(&config).inject(rows(100), 9);

        assert_eq!(out.len(), 110);
        assert_eq!(report.duplicates(), 10);
        assert_eq!(report.count("defect.null_region"), 50);
        for dup in &out[100..] {
            let original = &out[(dup.customer_id - 1) as usize];
            assert_eq!(original.row_key(), dup.row_key());
        }
    }

    #[test]
    fn injection_is_order_independent() {
        let config = DefectConfig {
            duplicate_rate: 0.05,
            null_price_rate: 0.2,
            null_region_rate: 0.2,
            recase_plan_rate: 0.2,
            alternate_date_rate: 0.3,
            unparseable_date_rate: 0.3,
            inverted_cancellation_rate: 0.3,
            ..DefectConfig::none()
        };
        let forward = DefectSet::from_config(&config);
        let mut reversed = DefectSet::from_config(&config);
        reversed.defects.reverse();

        let (a, report_a) = forward.inject(rows(60), 4);
        let (b, report_b) = reversed.inject(rows(60), 4);
        assert_eq!(a, b);
        assert_eq!(report_a, report_b);
    }
}
