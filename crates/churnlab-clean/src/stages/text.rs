use churnlab_core::{PAYMENT_METHODS, PlanTier, REGIONS, RawCustomer};

use crate::stages::Repaired;

/// Canonical spellings of each categorical field.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub plans: Vec<&'static str>,
    pub regions: Vec<&'static str>,
    pub payment_methods: Vec<&'static str>,
}

impl Vocabulary {
    pub fn standard() -> Self {
        Self {
            plans: PlanTier::ALL.iter().map(|plan| plan.name()).collect(),
            regions: REGIONS.iter().map(|region| region.name()).collect(),
            payment_methods: PAYMENT_METHODS.to_vec(),
        }
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
/// Any non-letter starts a new word.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Trim and re-case a categorical value. A case-insensitive match against
/// the vocabulary yields its canonical spelling; anything else is title-cased.
pub fn normalize_text(value: &str, vocabulary: &[&str]) -> Repaired<String> {
    let trimmed = value.trim();
    let canonical = vocabulary
        .iter()
        .find(|known| known.eq_ignore_ascii_case(trimmed))
        .map(|known| known.to_string())
        .unwrap_or_else(|| title_case(trimmed));
    if canonical == value {
        Repaired::unchanged(canonical)
    } else {
        Repaired::changed(canonical)
    }
}

/// Like [`normalize_text`], but blank text becomes null.
pub fn normalize_optional(value: Option<&str>, vocabulary: &[&str]) -> Repaired<Option<String>> {
    match value {
        None => Repaired::unchanged(None),
        Some(text) if text.trim().is_empty() => Repaired::changed(None),
        Some(text) => {
            let normalized = normalize_text(text, vocabulary);
            Repaired {
                value: Some(normalized.value),
                applied: normalized.applied,
            }
        }
    }
}

/// Normalize every categorical field of `row` in place. Returns the names of
/// the fields that changed.
pub fn normalize_row(row: &mut RawCustomer, vocabulary: &Vocabulary) -> Vec<&'static str> {
    let mut changed = Vec::new();

    let plan = normalize_text(&row.plan_name, &vocabulary.plans);
    if plan.applied {
        row.plan_name = plan.value;
        changed.push("plan_name");
    }

    let region = normalize_optional(row.region.as_deref(), &vocabulary.regions);
    if region.applied {
        row.region = region.value;
        changed.push("region");
    }

    let payment = normalize_text(&row.payment_method, &vocabulary.payment_methods);
    if payment.applied {
        row.payment_method = payment.value;
        changed.push("payment_method");
    }

    changed
}
