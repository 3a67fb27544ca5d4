//! Repair stages, in pipeline order.
//!
//! Each rule maps a raw field value plus its lookup context to a clean value
//! and whether the rule changed anything. Stages never read global state.

pub mod dedup;
pub mod missing;
pub mod parse;
pub mod text;
pub mod validate;

/// Output of a single repair rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired<T> {
    pub value: T,
    pub applied: bool,
}

impl<T> Repaired<T> {
    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            applied: false,
        }
    }

    pub fn changed(value: T) -> Self {
        Self {
            value,
            applied: true,
        }
    }
}
