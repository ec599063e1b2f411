//! BBL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::bar::Side;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, BblError>;

/// Top-level error type for the balance accumulator.
#[derive(Debug, Error)]
pub enum BblError {
    #[error("[BBL-1001] invalid weight: {subject} must be greater than zero, got {value}")]
    InvalidWeight { subject: &'static str, value: i64 },

    #[error(
        "[BBL-2001] capacity exceeded adding {weight} to {side} pan: load {total_load} + {weight} > {capacity}"
    )]
    CapacityExceeded {
        side: Side,
        weight: u64,
        total_load: u64,
        capacity: u64,
    },

    #[error("[BBL-2002] imbalance exceeded on {side} pan: projected {projected}, tolerance {tolerance}")]
    ImbalanceExceeded {
        side: Side,
        projected: u64,
        tolerance: u64,
    },

    #[error("[BBL-3001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[BBL-3002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[BBL-3003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[BBL-4001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[BBL-4002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[BBL-4900] runtime failure: {details}")]
    Runtime { details: String },
}

impl BblError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidWeight { .. } => "BBL-1001",
            Self::CapacityExceeded { .. } => "BBL-2001",
            Self::ImbalanceExceeded { .. } => "BBL-2002",
            Self::InvalidConfig { .. } => "BBL-3001",
            Self::MissingConfig { .. } => "BBL-3002",
            Self::ConfigParse { .. } => "BBL-3003",
            Self::Serialization { .. } => "BBL-4001",
            Self::Io { .. } => "BBL-4002",
            Self::Runtime { .. } => "BBL-4900",
        }
    }

    /// A rejected mutation: the accumulator is untouched and the caller may
    /// try again with another disc or pan.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::ImbalanceExceeded { .. }
        )
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.is_rejection() || matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for BblError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for BblError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
