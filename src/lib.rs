#![forbid(unsafe_code)]

//! barbell_balance: a balanced dual-pan load accumulator.
//!
//! Discs are stacked on a left and a right pan. Every mutation is checked
//! against two invariants before it is committed:
//! 1. **Capacity**: the combined load never exceeds the bar's ceiling
//! 2. **Balance**: the difference between the pans stays under the tolerance
//!
//! A rejected call leaves the bar untouched. [`bar::shared::SharedBar`] makes
//! the same guarantees across threads and can record every mutation to a JSONL
//! activity log.
//!
//! # Library usage
//!
//! ```rust
//! use barbell_balance::prelude::*;
//!
//! let mut bar = BalanceAccumulator::new(150)?;
//! bar.add_left(Disc::new(10)?)?;
//! bar.add_right(Disc::new(20)?)?;
//! assert_eq!(bar.imbalance(), 10);
//! assert_eq!(bar.add_auto(Disc::new(5)?)?, Side::Left);
//! # Ok::<(), BblError>(())
//! ```

pub mod prelude;

pub mod bar;
pub mod core;
pub mod logger;
