//! Balance policy: imbalance tolerance, boundary mode, and auto-add tie-break.
//!
//! The canonical policy keeps the imbalance strictly below 20 and breaks
//! auto-add ties toward the left pan. The inclusive boundary and the right-hand
//! tie-break are equally valid configurations, not defects.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::bar::Side;
use crate::core::errors::{BblError, Result};

/// Imbalance tolerance of the canonical bar.
pub const DEFAULT_IMBALANCE_TOLERANCE: u64 = 20;

/// Whether an imbalance exactly equal to the tolerance is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Imbalance must stay strictly below the tolerance.
    #[default]
    Exclusive,
    /// Imbalance may reach, but not pass, the tolerance.
    Inclusive,
}

impl Boundary {
    #[must_use]
    pub const fn permits(self, imbalance: u64, tolerance: u64) -> bool {
        match self {
            Self::Exclusive => imbalance < tolerance,
            Self::Inclusive => imbalance <= tolerance,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exclusive => "exclusive",
            Self::Inclusive => "inclusive",
        }
    }
}

impl std::str::FromStr for Boundary {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Ok(Self::Exclusive),
            "inclusive" => Ok(Self::Inclusive),
            other => Err(format!(
                "unknown boundary '{other}' (expected exclusive|inclusive)"
            )),
        }
    }
}

/// Everything a bar needs to decide whether a projected state is balanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePolicy {
    tolerance: u64,
    boundary: Boundary,
    tie_break: Side,
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_IMBALANCE_TOLERANCE,
            boundary: Boundary::Exclusive,
            tie_break: Side::Left,
        }
    }
}

impl BalancePolicy {
    /// Build a policy. A zero tolerance is rejected: with an exclusive
    /// boundary not even an empty bar would satisfy it.
    pub fn new(tolerance: u64, boundary: Boundary, tie_break: Side) -> Result<Self> {
        if tolerance == 0 {
            return Err(BblError::InvalidConfig {
                details: "imbalance_tolerance must be > 0".to_string(),
            });
        }
        Ok(Self {
            tolerance,
            boundary,
            tie_break,
        })
    }

    #[must_use]
    pub const fn tolerance(&self) -> u64 {
        self.tolerance
    }

    #[must_use]
    pub const fn boundary(&self) -> Boundary {
        self.boundary
    }

    #[must_use]
    pub const fn tie_break(&self) -> Side {
        self.tie_break
    }

    /// Whether a bar with this imbalance is acceptable.
    #[must_use]
    pub const fn permits(&self, imbalance: u64) -> bool {
        self.boundary.permits(imbalance, self.tolerance)
    }

    /// Pick the pan for an auto-add given both projected imbalances.
    #[must_use]
    pub fn choose(&self, left_projection: u64, right_projection: u64) -> Side {
        match left_projection.cmp(&right_projection) {
            std::cmp::Ordering::Less => Side::Left,
            std::cmp::Ordering::Greater => Side::Right,
            std::cmp::Ordering::Equal => self.tie_break,
        }
    }
}
