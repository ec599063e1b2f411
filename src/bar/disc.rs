//! Weighted disc: the unit of load placed on a pan.

use std::fmt;
use std::iter::Sum;

use serde::Serialize;

use crate::core::errors::{BblError, Result};

/// An immutable unit of load with a strictly positive weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Disc {
    weight: u64,
}

impl Disc {
    /// Build a disc, rejecting zero and negative weights.
    pub fn new(weight: i64) -> Result<Self> {
        let weight = positive("disc weight", weight)?;
        Ok(Self { weight })
    }

    /// Weight of the disc.
    #[must_use]
    pub const fn weight(self) -> u64 {
        self.weight
    }
}

impl fmt::Display for Disc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weight)
    }
}

impl TryFrom<i64> for Disc {
    type Error = BblError;

    fn try_from(weight: i64) -> Result<Self> {
        Self::new(weight)
    }
}

impl<'a> Sum<&'a Disc> for u64 {
    fn sum<I: Iterator<Item = &'a Disc>>(iter: I) -> Self {
        iter.map(|d| d.weight).sum()
    }
}

impl Sum<Disc> for u64 {
    fn sum<I: Iterator<Item = Disc>>(iter: I) -> Self {
        iter.map(|d| d.weight).sum()
    }
}

/// Shared positivity check for disc weights and bar capacity.
pub(crate) fn positive(subject: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(BblError::InvalidWeight { subject, value })
}
