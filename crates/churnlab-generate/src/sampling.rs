use chrono::{Duration, NaiveDate};
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_distr::{Normal, Poisson};

use churnlab_core::{AgeGroup, PlanTier, REGIONS, Region};

use crate::config::GeneratorConfig;
use crate::errors::GenerationError;

/// Pre-built distributions for one generation run.
#[derive(Debug, Clone)]
pub struct Sampler {
    age_groups: WeightedIndex<f64>,
    regions: WeightedIndex<f64>,
    plans: WeightedIndex<f64>,
    logins: Normal<f64>,
    session_minutes: Normal<f64>,
    support_tickets: Option<Poisson<f64>>,
    billing_issues: Option<Poisson<f64>>,
}

impl Sampler {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let engagement = &config.engagement;
        Ok(Self {
            age_groups: weighted("age_group_weights", &config.age_group_weights)?,
            regions: weighted("region_weights", &config.region_weights)?,
            plans: weighted("plan_weights", &config.plan_weights)?,
            logins: normal(
                "logins",
                engagement.logins_mean,
                engagement.logins_std_dev,
            )?,
            session_minutes: normal(
                "session_minutes",
                engagement.session_minutes_mean,
                engagement.session_minutes_std_dev,
            )?,
            support_tickets: poisson("support_tickets", engagement.support_tickets_rate)?,
            billing_issues: poisson("billing_issues", engagement.billing_issues_rate)?,
        })
    }

    pub fn age_group<R: Rng + ?Sized>(&self, rng: &mut R) -> AgeGroup {
        AgeGroup::ALL[self.age_groups.sample(rng)]
    }

    pub fn age<R: Rng + ?Sized>(&self, group: AgeGroup, rng: &mut R) -> u32 {
        let (min, max) = group.bounds();
        rng.random_range(min..=max)
    }

    pub fn region<R: Rng + ?Sized>(&self, rng: &mut R) -> Region {
        REGIONS[self.regions.sample(rng)]
    }

    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> PlanTier {
        PlanTier::ALL[self.plans.sample(rng)]
    }

    /// Monthly logins, clamped at zero and rounded to one decimal.
    pub fn logins<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        round1(self.logins.sample(rng).max(0.0))
    }

    /// Session minutes, clamped at zero and rounded to one decimal.
    pub fn session_minutes<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        round1(self.session_minutes.sample(rng).max(0.0))
    }

    pub fn support_tickets<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        count(self.support_tickets.as_ref(), rng)
    }

    pub fn billing_issues<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        count(self.billing_issues.as_ref(), rng)
    }
}

/// Uniform date in `[start, end]`; returns `start` when the range is empty.
pub fn date_between<R: Rng + ?Sized>(start: NaiveDate, end: NaiveDate, rng: &mut R) -> NaiveDate {
    let span = (end - start).num_days();
    if span <= 0 {
        return start;
    }
    start + Duration::days(rng.random_range(0..=span))
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive an independent stream seed from the run seed and a stream name.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Derive the seed of a single row within a stream.
pub fn hash_row_seed(stream_seed: u64, row_index: u64) -> u64 {
    let hash = stream_seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash.wrapping_mul(0x100000001b3)
}

fn count<R: Rng + ?Sized>(dist: Option<&Poisson<f64>>, rng: &mut R) -> u32 {
    match dist {
        Some(dist) => dist.sample(rng) as u32,
        None => 0,
    }
}

fn weighted(name: &str, weights: &[f64]) -> Result<WeightedIndex<f64>, GenerationError> {
    WeightedIndex::new(weights)
        .map_err(|err| GenerationError::InvalidConfiguration(format!("{name}: {err}")))
}

fn normal(name: &str, mean: f64, std_dev: f64) -> Result<Normal<f64>, GenerationError> {
    Normal::new(mean, std_dev)
        .map_err(|err| GenerationError::InvalidConfiguration(format!("{name}: {err}")))
}

fn poisson(name: &str, rate: f64) -> Result<Option<Poisson<f64>>, GenerationError> {
    if rate == 0.0 {
        return Ok(None);
    }
    Poisson::new(rate)
        .map(Some)
        .map_err(|err| GenerationError::InvalidConfiguration(format!("{name}: {err}")))
}
