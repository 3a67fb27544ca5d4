//! Fixed reference data: plans, regions, payment methods, and the segment
//! buckets used to slice churn.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel written to `region` when the raw value is missing.
pub const UNKNOWN_REGION: &str = "Unknown";

pub const PAYMENT_METHODS: [&str; 4] = ["Credit Card", "Debit Card", "PayPal", "Bank Transfer"];

pub const CANCELLATION_REASONS: [&str; 6] = [
    "Too Expensive",
    "Not Enough Content",
    "Technical Issues",
    "Switching to Competitor",
    "No Longer Needed",
    "Found Better Alternative",
];

/// Subscription plan tiers, ordered from cheapest to most expensive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlanTier {
    Basic,
    Standard,
    Premium,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Basic, PlanTier::Standard, PlanTier::Premium];

    pub fn name(self) -> &'static str {
        match self {
            PlanTier::Basic => "Basic",
            PlanTier::Standard => "Standard",
            PlanTier::Premium => "Premium",
        }
    }

    pub fn plan_id(self) -> u32 {
        match self {
            PlanTier::Basic => 1,
            PlanTier::Standard => 2,
            PlanTier::Premium => 3,
        }
    }

    /// Canonical monthly price.
    pub fn price(self) -> f64 {
        match self {
            PlanTier::Basic => 9.99,
            PlanTier::Standard => 15.99,
            PlanTier::Premium => 22.99,
        }
    }

    pub fn features(self) -> &'static str {
        match self {
            PlanTier::Basic => "1 screen, SD quality",
            PlanTier::Standard => "2 screens, HD quality",
            PlanTier::Premium => "4 screens, 4K quality",
        }
    }

    /// Exact (case-sensitive) lookup by canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|plan| plan.name() == name)
    }
}

/// Customer regions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Northeast,
    Southeast,
    Midwest,
    Southwest,
    West,
    International,
}

pub const REGIONS: [Region; 6] = [
    Region::Northeast,
    Region::Southeast,
    Region::Midwest,
    Region::Southwest,
    Region::West,
    Region::International,
];

impl Region {
    pub fn name(self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::Southeast => "Southeast",
            Region::Midwest => "Midwest",
            Region::Southwest => "Southwest",
            Region::West => "West",
            Region::International => "International",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        REGIONS.into_iter().find(|region| region.name() == name)
    }
}

/// Age buckets. The open-ended bucket is sampled up to 80 but accepts any age
/// up to the schema maximum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeGroup {
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    From55To64,
    From65,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::From18To24,
        AgeGroup::From25To34,
        AgeGroup::From35To44,
        AgeGroup::From45To54,
        AgeGroup::From55To64,
        AgeGroup::From65,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::From18To24 => "18-24",
            AgeGroup::From25To34 => "25-34",
            AgeGroup::From35To44 => "35-44",
            AgeGroup::From45To54 => "45-54",
            AgeGroup::From55To64 => "55-64",
            AgeGroup::From65 => "65+",
        }
    }

    /// Inclusive sampling bounds.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            AgeGroup::From18To24 => (18, 24),
            AgeGroup::From25To34 => (25, 34),
            AgeGroup::From35To44 => (35, 44),
            AgeGroup::From45To54 => (45, 54),
            AgeGroup::From55To64 => (55, 64),
            AgeGroup::From65 => (65, 80),
        }
    }

    pub fn from_age(age: u32) -> Option<Self> {
        match age {
            0..=17 => None,
            18..=24 => Some(AgeGroup::From18To24),
            25..=34 => Some(AgeGroup::From25To34),
            35..=44 => Some(AgeGroup::From35To44),
            45..=54 => Some(AgeGroup::From45To54),
            55..=64 => Some(AgeGroup::From55To64),
            _ => Some(AgeGroup::From65),
        }
    }

    pub fn is_young(self) -> bool {
        matches!(self, AgeGroup::From18To24 | AgeGroup::From25To34)
    }
}

/// Login-frequency bucket used to segment churn risk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngagementTier {
    VeryLow,
    Low,
    Medium,
    High,
}

impl EngagementTier {
    pub const ALL: [EngagementTier; 4] = [
        EngagementTier::VeryLow,
        EngagementTier::Low,
        EngagementTier::Medium,
        EngagementTier::High,
    ];

    pub fn from_logins(avg_monthly_logins: f64) -> Self {
        if avg_monthly_logins < 3.0 {
            EngagementTier::VeryLow
        } else if avg_monthly_logins < 8.0 {
            EngagementTier::Low
        } else if avg_monthly_logins < 15.0 {
            EngagementTier::Medium
        } else {
            EngagementTier::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EngagementTier::VeryLow => "Very Low (<3/mo)",
            EngagementTier::Low => "Low (3-7/mo)",
            EngagementTier::Medium => "Medium (8-14/mo)",
            EngagementTier::High => "High (15+/mo)",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TenureTier {
    UpTo3Months,
    UpTo6Months,
    UpTo12Months,
    UpTo24Months,
    Over24Months,
}

impl TenureTier {
    pub const ALL: [TenureTier; 5] = [
        TenureTier::UpTo3Months,
        TenureTier::UpTo6Months,
        TenureTier::UpTo12Months,
        TenureTier::UpTo24Months,
        TenureTier::Over24Months,
    ];

    pub fn from_months(tenure_months: i64) -> Self {
        match tenure_months {
            i64::MIN..=3 => TenureTier::UpTo3Months,
            4..=6 => TenureTier::UpTo6Months,
            7..=12 => TenureTier::UpTo12Months,
            13..=24 => TenureTier::UpTo24Months,
            _ => TenureTier::Over24Months,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TenureTier::UpTo3Months => "0-3 months",
            TenureTier::UpTo6Months => "3-6 months",
            TenureTier::UpTo12Months => "6-12 months",
            TenureTier::UpTo24Months => "1-2 years",
            TenureTier::Over24Months => "2+ years",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BillingTier {
    NoIssues,
    OneIssue,
    TwoOrMore,
}

impl BillingTier {
    pub const ALL: [BillingTier; 3] = [
        BillingTier::NoIssues,
        BillingTier::OneIssue,
        BillingTier::TwoOrMore,
    ];

    pub fn from_count(billing_issues_count: u32) -> Self {
        match billing_issues_count {
            0 => BillingTier::NoIssues,
            1 => BillingTier::OneIssue,
            _ => BillingTier::TwoOrMore,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BillingTier::NoIssues => "No Issues",
            BillingTier::OneIssue => "1 Issue",
            BillingTier::TwoOrMore => "2+ Issues",
        }
    }
}

/// Row of the plan lookup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanEntry {
    pub plan_id: u32,
    pub plan_name: String,
    pub price: f64,
    pub features: String,
}

/// Immutable plan lookup keyed by canonical plan name.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: BTreeMap<String, PlanTier>,
}

impl PlanCatalog {
    pub fn standard() -> Self {
        let plans = PlanTier::ALL
            .into_iter()
            .map(|plan| (plan.name().to_string(), plan))
            .collect();
        Self { plans }
    }

    pub fn plan(&self, name: &str) -> Option<PlanTier> {
        self.plans.get(name).copied()
    }

    pub fn price_of(&self, name: &str) -> Option<f64> {
        self.plan(name).map(PlanTier::price)
    }

    /// Lookup rows ordered by plan id.
    pub fn entries(&self) -> Vec<PlanEntry> {
        let mut entries: Vec<PlanEntry> = self
            .plans
            .values()
            .map(|plan| PlanEntry {
                plan_id: plan.plan_id(),
                plan_name: plan.name().to_string(),
                price: plan.price(),
                features: plan.features().to_string(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.plan_id);
        entries
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
