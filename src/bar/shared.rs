//! Thread-safe bar handle.
//!
//! The capacity check, the balance check and the push/pop of every operation
//! run under one `parking_lot::Mutex` scoped to the bar, since both checks read
//! the sums of both pans before either pan changes. Activity events are sent
//! while the lock is held so the log order matches the mutation order; sending
//! never blocks.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bar::Side;
use crate::bar::accumulator::{BalanceAccumulator, BarStats};
use crate::bar::disc::Disc;
use crate::core::config::Config;
use crate::core::errors::{BblError, Result};
use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle};

/// Cloneable handle to one bar shared between threads.
#[derive(Debug, Clone)]
pub struct SharedBar {
    inner: Arc<Mutex<BalanceAccumulator>>,
    activity: Option<ActivityLoggerHandle>,
}

impl SharedBar {
    #[must_use]
    pub fn new(bar: BalanceAccumulator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bar)),
            activity: None,
        }
    }

    /// Build an empty bar from the `[bar]` section.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(BalanceAccumulator::from_config(&config.bar)?))
    }

    /// Record every mutation through `handle`, starting with a `BarOpened`
    /// event describing the bar.
    #[must_use]
    pub fn with_activity(mut self, handle: ActivityLoggerHandle, config_hash: Option<String>) -> Self {
        {
            let bar = self.inner.lock();
            handle.send(ActivityEvent::BarOpened {
                capacity: bar.capacity(),
                tolerance: bar.policy().tolerance(),
                config_hash,
            });
        }
        self.activity = Some(handle);
        self
    }

    // ──────────────────── reads ────────────────────

    pub fn total_load(&self) -> u64 {
        self.inner.lock().total_load()
    }

    pub fn imbalance(&self) -> u64 {
        self.inner.lock().imbalance()
    }

    pub fn stats(&self) -> BarStats {
        self.inner.lock().stats()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Text depiction of the bar at this instant.
    pub fn render(&self) -> String {
        self.inner.lock().to_string()
    }

    /// Run a read-only closure against a consistent view of the bar.
    pub fn inspect<R>(&self, f: impl FnOnce(&BalanceAccumulator) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Owned copy of the bar at this instant.
    pub fn snapshot(&self) -> BalanceAccumulator {
        self.inner.lock().clone()
    }

    // ──────────────────── mutations ────────────────────

    pub fn add(&self, side: Side, disc: Disc) -> Result<()> {
        let mut bar = self.inner.lock();
        let outcome = bar.add(side, disc);
        self.record_add(&bar, Some(side), disc, outcome.as_ref().err());
        outcome
    }

    pub fn add_left(&self, disc: Disc) -> Result<()> {
        self.add(Side::Left, disc)
    }

    pub fn add_right(&self, disc: Disc) -> Result<()> {
        self.add(Side::Right, disc)
    }

    pub fn add_auto(&self, disc: Disc) -> Result<Side> {
        let mut bar = self.inner.lock();
        let outcome = bar.add_auto(disc);
        match &outcome {
            Ok(side) => self.record_add(&bar, Some(*side), disc, None),
            Err(err) => self.record_add(&bar, rejected_side(err), disc, Some(err)),
        }
        outcome
    }

    pub fn remove(&self, side: Side) -> Result<Option<Disc>> {
        let mut bar = self.inner.lock();
        let outcome = bar.remove(side);
        if let Some(activity) = &self.activity {
            match &outcome {
                Ok(Some(disc)) => activity.send(ActivityEvent::DiscRemoved {
                    side,
                    weight: disc.weight(),
                    total_load: bar.total_load(),
                    imbalance: bar.imbalance(),
                }),
                Ok(None) => {}
                Err(err) => activity.send(ActivityEvent::RemoveRejected {
                    side,
                    code: err.code().to_string(),
                    message: err.to_string(),
                }),
            }
        }
        outcome
    }

    pub fn remove_left(&self) -> Result<Option<Disc>> {
        self.remove(Side::Left)
    }

    pub fn remove_right(&self) -> Result<Option<Disc>> {
        self.remove(Side::Right)
    }

    fn record_add(
        &self,
        bar: &BalanceAccumulator,
        side: Option<Side>,
        disc: Disc,
        error: Option<&BblError>,
    ) {
        let Some(activity) = &self.activity else {
            return;
        };
        let event = match (error, side) {
            (None, Some(side)) => ActivityEvent::DiscAdded {
                side,
                weight: disc.weight(),
                total_load: bar.total_load(),
                imbalance: bar.imbalance(),
            },
            (err, side) => ActivityEvent::AddRejected {
                side,
                weight: disc.weight(),
                code: err.map_or_else(String::new, |e| e.code().to_string()),
                message: err.map_or_else(String::new, ToString::to_string),
            },
        };
        activity.send(event);
    }
}

fn rejected_side(err: &BblError) -> Option<Side> {
    match err {
        BblError::CapacityExceeded { side, .. } | BblError::ImbalanceExceeded { side, .. } => {
            Some(*side)
        }
        _ => None,
    }
}
