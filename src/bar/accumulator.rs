//! Balance accumulator: two disc stacks under a capacity ceiling and an
//! imbalance tolerance.
//!
//! Every mutation projects the post-mutation state first and only commits when
//! both invariants hold for it:
//! - capacity: `load(left) + load(right) <= capacity`
//! - balance:  `policy.permits(|load(left) - load(right)|)`
//!
//! A rejected call leaves both pans exactly as they were. Capacity is checked
//! before balance, so a disc that breaks both reports `CapacityExceeded`.

#![allow(missing_docs)]

use std::fmt;

use serde::Serialize;

use crate::bar::Side;
use crate::bar::disc::{Disc, positive};
use crate::bar::policy::BalancePolicy;
use crate::bar::render;
use crate::core::config::BarConfig;
use crate::core::errors::{BblError, Result};

/// Point-in-time statistics of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BarStats {
    pub capacity: u64,
    pub total_load: u64,
    pub left_load: u64,
    pub right_load: u64,
    pub imbalance: u64,
    pub tolerance: u64,
    pub headroom: u64,
    pub left_discs: usize,
    pub right_discs: usize,
}

/// Two pans of discs with invariant-checked mutation.
#[derive(Debug, Clone)]
pub struct BalanceAccumulator {
    capacity: u64,
    policy: BalancePolicy,
    left: Vec<Disc>,
    right: Vec<Disc>,
}

impl BalanceAccumulator {
    /// Empty bar with the default policy.
    pub fn new(capacity: i64) -> Result<Self> {
        Self::with_policy(capacity, BalancePolicy::default())
    }

    /// Empty bar with an explicit policy.
    pub fn with_policy(capacity: i64, policy: BalancePolicy) -> Result<Self> {
        let capacity = positive("capacity", capacity)?;
        Ok(Self::empty(capacity, policy))
    }

    /// Empty bar built from the `[bar]` configuration section.
    pub fn from_config(config: &BarConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(BblError::InvalidWeight {
                subject: "capacity",
                value: 0,
            });
        }
        Ok(Self::empty(config.capacity, config.policy()?))
    }

    fn empty(capacity: u64, policy: BalancePolicy) -> Self {
        Self {
            capacity,
            policy,
            left: Vec::new(),
            right: Vec::new(),
        }
    }

    // ──────────────────── reads ────────────────────

    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    #[must_use]
    pub const fn policy(&self) -> &BalancePolicy {
        &self.policy
    }

    /// Combined load of both pans.
    #[must_use]
    pub fn total_load(&self) -> u64 {
        self.left_load() + self.right_load()
    }

    /// Absolute difference between the pans.
    #[must_use]
    pub fn imbalance(&self) -> u64 {
        self.left_load().abs_diff(self.right_load())
    }

    #[must_use]
    pub fn load(&self, side: Side) -> u64 {
        self.pan(side).iter().sum()
    }

    #[must_use]
    pub fn left_load(&self) -> u64 {
        self.load(Side::Left)
    }

    #[must_use]
    pub fn right_load(&self) -> u64 {
        self.load(Side::Right)
    }

    /// Discs on a pan, oldest first.
    #[must_use]
    pub fn discs(&self, side: Side) -> &[Disc] {
        self.pan(side)
    }

    #[must_use]
    pub fn disc_count(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Load still available under the capacity ceiling.
    #[must_use]
    pub fn headroom(&self) -> u64 {
        self.capacity.saturating_sub(self.total_load())
    }

    /// True only when both pans are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> BarStats {
        let left_load = self.left_load();
        let right_load = self.right_load();
        let total_load = left_load + right_load;
        BarStats {
            capacity: self.capacity,
            total_load,
            left_load,
            right_load,
            imbalance: left_load.abs_diff(right_load),
            tolerance: self.policy.tolerance(),
            headroom: self.capacity.saturating_sub(total_load),
            left_discs: self.left.len(),
            right_discs: self.right.len(),
        }
    }

    // ──────────────────── adds ────────────────────

    /// Verify that `disc` could be added to `side` without committing it.
    pub fn check_add(&self, side: Side, disc: &Disc) -> Result<()> {
        let weight = disc.weight();
        let total_load = self.total_load();
        if total_load.checked_add(weight).is_none_or(|t| t > self.capacity) {
            return Err(BblError::CapacityExceeded {
                side,
                weight,
                total_load,
                capacity: self.capacity,
            });
        }

        let projected = self.projected_add(side, weight);
        if !self.policy.permits(projected) {
            return Err(BblError::ImbalanceExceeded {
                side,
                projected,
                tolerance: self.policy.tolerance(),
            });
        }
        Ok(())
    }

    /// Push `disc` onto `side`.
    pub fn add(&mut self, side: Side, disc: Disc) -> Result<()> {
        self.check_add(side, &disc)?;
        self.pan_mut(side).push(disc);
        Ok(())
    }

    pub fn add_left(&mut self, disc: Disc) -> Result<()> {
        self.add(Side::Left, disc)
    }

    pub fn add_right(&mut self, disc: Disc) -> Result<()> {
        self.add(Side::Right, disc)
    }

    /// Put `disc` on whichever pan leaves the smaller imbalance, and report
    /// the pan chosen. Failures are reported against that pan; the other pan
    /// is never tried as a fallback.
    pub fn add_auto(&mut self, disc: Disc) -> Result<Side> {
        let side = self.policy.choose(
            self.projected_add(Side::Left, disc.weight()),
            self.projected_add(Side::Right, disc.weight()),
        );
        self.add(side, disc)?;
        Ok(side)
    }

    // ──────────────────── removals ────────────────────

    /// Pop the most recently added disc from `side`.
    ///
    /// `Ok(None)` means the pan was already empty. The pop is refused when the
    /// remaining pans would be out of balance, since taking load off one side
    /// can widen the gap as easily as close it.
    pub fn remove(&mut self, side: Side) -> Result<Option<Disc>> {
        let Some(top) = self.pan(side).last().copied() else {
            return Ok(None);
        };

        let remaining = self.load(side) - top.weight();
        let projected = remaining.abs_diff(self.load(side.other()));
        if !self.policy.permits(projected) {
            return Err(BblError::ImbalanceExceeded {
                side,
                projected,
                tolerance: self.policy.tolerance(),
            });
        }

        Ok(self.pan_mut(side).pop())
    }

    pub fn remove_left(&mut self) -> Result<Option<Disc>> {
        self.remove(Side::Left)
    }

    pub fn remove_right(&mut self) -> Result<Option<Disc>> {
        self.remove(Side::Right)
    }

    // ──────────────────── internals ────────────────────

    /// Imbalance after a hypothetical add. Saturates, since `add_auto` asks
    /// before the capacity check has run.
    fn projected_add(&self, side: Side, weight: u64) -> u64 {
        self.load(side)
            .saturating_add(weight)
            .abs_diff(self.load(side.other()))
    }

    fn pan(&self, side: Side) -> &Vec<Disc> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn pan_mut(&mut self, side: Side) -> &mut Vec<Disc> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

impl fmt::Display for BalanceAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::render(&self.left, &self.right))
    }
}
