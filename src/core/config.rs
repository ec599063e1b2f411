//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bar::Side;
use crate::bar::policy::{BalancePolicy, Boundary, DEFAULT_IMBALANCE_TOLERANCE};
use crate::core::errors::{BblError, Result};
use crate::logger::activity::CHANNEL_CAPACITY;

/// Full configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub bar: BarConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Capacity and balance policy of a bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BarConfig {
    pub capacity: u64,
    pub imbalance_tolerance: u64,
    pub boundary: Boundary,
    pub tie_break: Side,
}

/// Activity log tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// When false no logger thread is started.
    pub enabled: bool,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
    pub channel_capacity: usize,
}

/// Filesystem paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
    pub jsonl_fallback: Option<PathBuf>,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            capacity: 150,
            imbalance_tolerance: DEFAULT_IMBALANCE_TOLERANCE,
            boundary: Boundary::Exclusive,
            tie_break: Side::Left,
        }
    }
}

impl BarConfig {
    /// Balance policy described by this section.
    pub fn policy(&self) -> Result<BalancePolicy> {
        BalancePolicy::new(self.imbalance_tolerance, self.boundary, self.tie_break)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 5,
            fsync_interval_secs: 10,
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[BBL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("bbl").join("config.toml"),
            jsonl_log: home_dir
                .join(".local")
                .join("share")
                .join("bbl")
                .join("activity.jsonl"),
            jsonl_fallback: None,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from the default or an explicit path, then apply env overrides.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| BblError::io(&path_buf, source))?;
            Self::from_toml_str(&raw)?
        } else if path.is_some() {
            return Err(BblError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without env overrides or validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic FNV-1a hash of the effective config, for log lines.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        set_parsed("BBL_BAR_CAPACITY", &mut lookup, &mut self.bar.capacity)?;
        set_parsed(
            "BBL_BAR_IMBALANCE_TOLERANCE",
            &mut lookup,
            &mut self.bar.imbalance_tolerance,
        )?;
        set_parsed("BBL_BAR_BOUNDARY", &mut lookup, &mut self.bar.boundary)?;
        set_parsed("BBL_BAR_TIE_BREAK", &mut lookup, &mut self.bar.tie_break)?;

        if let Some(raw) = lookup("BBL_LOG_ENABLED") {
            self.logging.enabled = parse_env_bool("BBL_LOG_ENABLED", &raw)?;
        }
        set_parsed(
            "BBL_LOG_MAX_SIZE_BYTES",
            &mut lookup,
            &mut self.logging.max_size_bytes,
        )?;
        set_parsed(
            "BBL_LOG_MAX_ROTATED_FILES",
            &mut lookup,
            &mut self.logging.max_rotated_files,
        )?;
        if let Some(raw) = lookup("BBL_LOG_PATH") {
            self.paths.jsonl_log = PathBuf::from(raw.trim());
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.bar.capacity == 0 {
            return Err(invalid("bar.capacity must be > 0"));
        }
        if self.bar.imbalance_tolerance == 0 {
            return Err(invalid("bar.imbalance_tolerance must be > 0"));
        }
        if self.logging.max_size_bytes < 1024 {
            return Err(invalid("logging.max_size_bytes must be >= 1024"));
        }
        if self.logging.channel_capacity == 0 {
            return Err(invalid("logging.channel_capacity must be > 0"));
        }
        if self.logging.enabled && self.paths.jsonl_log.as_os_str().is_empty() {
            return Err(invalid("paths.jsonl_log must be set when logging is enabled"));
        }
        Ok(())
    }
}

fn invalid(details: &str) -> BblError {
    BblError::InvalidConfig {
        details: details.to_string(),
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn set_parsed<T, F>(name: &str, lookup: &mut F, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().parse().map_err(|e| BblError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {e}"),
        })?;
    }
    Ok(())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BblError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        cfg.validate().expect("default config should validate");
        assert_eq!(cfg.bar.capacity, 150);
        assert_eq!(cfg.bar.imbalance_tolerance, 20);
        assert_eq!(cfg.bar.policy().unwrap(), BalancePolicy::default());
    }

    #[test]
    fn toml_sections_parse_with_defaults_for_missing_keys() {
        let cfg = Config::from_toml_str(
            r#"
            [bar]
            capacity = 300
            boundary = "inclusive"
            tie_break = "right"

            [logging]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bar.capacity, 300);
        assert_eq!(cfg.bar.imbalance_tolerance, 20);
        assert_eq!(cfg.bar.boundary, Boundary::Inclusive);
        assert_eq!(cfg.bar.tie_break, Side::Right);
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.logging.max_rotated_files, 5);
    }

    #[test]
    fn bad_toml_value_is_parse_error() {
        let err = Config::from_toml_str("[bar]\nboundary = \"sideways\"\n").unwrap_err();
        assert_eq!(err.code(), "BBL-3003");
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut cfg = Config::default();
        cfg.bar.capacity = 0;
        let err = cfg.validate().expect_err("expected capacity error");
        assert!(err.to_string().contains("bar.capacity"));
    }

    #[test]
    fn zero_tolerance_rejected() {
        let mut cfg = Config::default();
        cfg.bar.imbalance_tolerance = 0;
        let err = cfg.validate().expect_err("expected tolerance error");
        assert!(err.to_string().contains("imbalance_tolerance"));
    }

    #[test]
    fn tiny_log_size_rejected() {
        let mut cfg = Config::default();
        cfg.logging.max_size_bytes = 10;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_size_bytes"));
    }

    #[test]
    fn env_overrides_bar_section() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("BBL_BAR_CAPACITY", "90"),
            ("BBL_BAR_IMBALANCE_TOLERANCE", " 12 "),
            ("BBL_BAR_BOUNDARY", "inclusive"),
            ("BBL_BAR_TIE_BREAK", "RIGHT"),
        ]);
        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect("env overrides should parse");
        assert_eq!(cfg.bar.capacity, 90);
        assert_eq!(cfg.bar.imbalance_tolerance, 12);
        assert_eq!(cfg.bar.boundary, Boundary::Inclusive);
        assert_eq!(cfg.bar.tie_break, Side::Right);
    }

    #[test]
    fn env_overrides_logging_section() {
        let mut cfg = Config::default();
        let overrides = vars(&[
            ("BBL_LOG_ENABLED", "yes"),
            ("BBL_LOG_PATH", "/tmp/bbl/custom.jsonl"),
            ("BBL_LOG_MAX_SIZE_BYTES", "4096"),
            ("BBL_LOG_MAX_ROTATED_FILES", "2"),
        ]);
        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .unwrap();
        assert!(cfg.logging.enabled);
        assert_eq!(cfg.paths.jsonl_log, PathBuf::from("/tmp/bbl/custom.jsonl"));
        assert_eq!(cfg.logging.max_size_bytes, 4096);
        assert_eq!(cfg.logging.max_rotated_files, 2);
    }

    #[test]
    fn env_invalid_number_names_the_variable() {
        let mut cfg = Config::default();
        let overrides = vars(&[("BBL_BAR_CAPACITY", "heavy")]);
        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("invalid number should fail");
        match err {
            BblError::ConfigParse { context, details } => {
                assert_eq!(context, "env");
                assert!(details.contains("BBL_BAR_CAPACITY"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_invalid_boolean_rejected() {
        let mut cfg = Config::default();
        let overrides = vars(&[("BBL_LOG_ENABLED", "maybe")]);
        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("BBL_LOG_ENABLED"));
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let err = Config::load(Some(Path::new("/nonexistent/bbl/config.toml"))).unwrap_err();
        assert!(matches!(err, BblError::MissingConfig { .. }));
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[bar]\ncapacity = 75\n").unwrap();
        let cfg = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(cfg.paths.config_file, path);
        // BBL_BAR_CAPACITY is not expected to be set in the test environment.
        if env::var_os("BBL_BAR_CAPACITY").is_none() {
            assert_eq!(cfg.bar.capacity, 75);
        }
    }

    #[test]
    fn load_validates_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[bar]\nimbalance_tolerance = 0\n").unwrap();
        if env::var_os("BBL_BAR_IMBALANCE_TOLERANCE").is_none() {
            let err = Config::load(Some(path.as_path())).unwrap_err();
            assert_eq!(err.code(), "BBL-3001");
        }
    }

    #[test]
    fn stable_hash_tracks_changes() {
        let cfg = Config::default();
        assert_eq!(cfg.stable_hash().unwrap(), cfg.stable_hash().unwrap());
        let mut changed = cfg.clone();
        changed.bar.capacity = 151;
        assert_ne!(cfg.stable_hash().unwrap(), changed.stable_hash().unwrap());
    }
}
