//! Convenience re-exports for library consumers.
//!
//! ```rust
//! use barbell_balance::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{BblError, Result};

// Bar
pub use crate::bar::Side;
pub use crate::bar::accumulator::{BalanceAccumulator, BarStats};
pub use crate::bar::disc::Disc;
pub use crate::bar::policy::{BalancePolicy, Boundary};
pub use crate::bar::shared::SharedBar;

// Logger
pub use crate::logger::activity::{ActivityLoggerConfig, ActivityLoggerHandle, spawn_logger};
