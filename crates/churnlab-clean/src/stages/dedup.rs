use std::collections::{HashMap, HashSet};

use churnlab_core::{CustomerRecord, RawCustomer};

use crate::model::DedupStrategy;

/// Keep the first occurrence of each row identity. Returns the surviving
/// rows (in input order) and the number removed.
pub fn deduplicate(rows: Vec<RawCustomer>, strategy: DedupStrategy) -> (Vec<RawCustomer>, u64) {
    let before = rows.len();
    let mut seen = HashSet::new();
    let kept: Vec<RawCustomer> = rows
        .into_iter()
        .filter(|row| seen.insert(identity(row, strategy)))
        .collect();
    let removed = (before - kept.len()) as u64;
    (kept, removed)
}

fn identity(row: &RawCustomer, strategy: DedupStrategy) -> String {
    match strategy {
        DedupStrategy::ExactRow => row.row_key(),
        DedupStrategy::CustomerId => row.customer_id.to_string(),
    }
}

/// What happened to a validated record offered to the clean output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Same id and identical values once normalized.
    Duplicate,
    /// Same id as an accepted record but different values.
    Conflict,
}

/// Clean-output records keyed by `customer_id`, which must stay unique.
#[derive(Debug, Default)]
pub struct IdLedger {
    index: HashMap<u64, usize>,
    records: Vec<CustomerRecord>,
}

impl IdLedger {
    pub fn admit(&mut self, record: CustomerRecord) -> Admission {
        match self.index.get(&record.customer_id) {
            Some(&position) if self.records[position] == record => Admission::Duplicate,
            Some(_) => Admission::Conflict,
            None => {
                self.index.insert(record.customer_id, self.records.len());
                self.records.push(record);
                Admission::Accepted
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CustomerRecord> {
        self.records
    }
}
