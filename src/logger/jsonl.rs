//! JSONL activity log: one self-contained JSON object per line.
//!
//! Lines are assembled in memory and handed to `write_all` whole so a reader
//! tailing the file never sees a half-written record.
//!
//! Degradation chain when a write target fails:
//! 1. Primary file path
//! 2. Fallback path, if configured
//! 3. stderr with a `[BBL-JSONL]` prefix
//! 4. Silent discard (a bar operation never fails because logging did)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::bar::Side;
use crate::core::errors::{BblError, Result};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Kinds of activity recorded for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    BarOpened,
    DiscAdded,
    AddRejected,
    DiscRemoved,
    RemoveRejected,
    LoggerNotice,
}

/// A single log line. Only `ts`, `event` and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_load: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imbalance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            side: None,
            weight: None,
            total_load: None,
            imbalance: None,
            capacity: None,
            ok: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Where and how the JSONL writer stores lines.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// Size at which the current file is rotated.
    pub max_size_bytes: u64,
    /// Rotated generations kept (`file.1` is the newest).
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: std::env::temp_dir().join("bbl-activity.jsonl"),
            fallback_path: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 5,
            fsync_interval_secs: 10,
        }
    }
}

/// Append-only JSONL writer with size rotation and a fallback chain.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
    last_fsync: SystemTime,
}

impl JsonlWriter {
    /// Open the log. Never fails: an unusable path just degrades the writer.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
            last_fsync: SystemTime::now(),
        };
        w.open_primary_or_fallback();
        w
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => self.write_line(&format!("{json}\n")),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[BBL-JSONL] serialize error: {e}");
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    pub fn fsync(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
            let _ = w.get_ref().sync_data();
        }
        self.last_fsync = SystemTime::now();
    }

    /// Current degradation state: `normal`, `fallback`, `stderr` or `discard`.
    pub fn state(&self) -> &'static str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Bytes in the current file, including what was there when opened.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Return to the primary path if it has become writable again.
    pub fn try_recover(&mut self) {
        if self.state == WriterState::Normal {
            return;
        }
        if let Ok((file, size)) = open_append(&self.config.path) {
            self.flush();
            self.attach(file, size, WriterState::Normal);
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn attach(&mut self, file: File, size: u64, state: WriterState) {
        self.writer = Some(BufWriter::with_capacity(64 * 1024, file));
        self.state = state;
        self.bytes_written = size;
    }

    fn current_path(&self) -> Option<&Path> {
        match self.state {
            WriterState::Normal => Some(&self.config.path),
            WriterState::Fallback => self.config.fallback_path.as_deref(),
            WriterState::Stderr | WriterState::Discard => None,
        }
    }

    fn write_line(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.bytes_written > 0 && self.bytes_written + len > self.config.max_size_bytes {
            self.rotate();
        }

        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                let written = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if written {
                    self.bytes_written += len;
                    self.maybe_fsync();
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[BBL-JSONL] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn maybe_fsync(&mut self) {
        let elapsed = SystemTime::now()
            .duration_since(self.last_fsync)
            .unwrap_or(Duration::ZERO);
        if elapsed.as_secs() >= self.config.fsync_interval_secs {
            self.fsync();
        }
    }

    fn open_primary_or_fallback(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => self.attach(file, size, WriterState::Normal),
            Err(_) => self.open_fallback(),
        }
    }

    fn open_fallback(&mut self) {
        let Some(fallback) = self.config.fallback_path.clone() else {
            self.state = WriterState::Stderr;
            let _ = writeln!(
                io::stderr(),
                "[BBL-JSONL] primary path failed and no fallback configured, using stderr"
            );
            return;
        };
        match open_append(&fallback) {
            Ok((file, size)) => {
                let _ = writeln!(
                    io::stderr(),
                    "[BBL-JSONL] primary path failed, using fallback: {}",
                    fallback.display()
                );
                self.attach(file, size, WriterState::Fallback);
            }
            Err(_) => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[BBL-JSONL] primary and fallback paths failed, using stderr"
                );
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => self.open_fallback(),
            WriterState::Fallback => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[BBL-JSONL] fallback write failed, using stderr");
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }

    fn rotate(&mut self) {
        let Some(base) = self.current_path().map(Path::to_path_buf) else {
            return;
        };
        self.flush();
        self.writer = None;

        // Oldest generation falls off, the rest shift up by one, current -> .1
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = fs::rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        if self.config.max_rotated_files > 0 {
            let _ = fs::rename(&base, rotated_name(&base, 1));
        } else {
            let _ = fs::remove_file(&base);
        }

        match open_append(&base) {
            Ok((file, size)) => {
                let state = self.state;
                self.attach(file, size, state);
            }
            Err(_) => self.degrade(),
        }
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns the file and its current size.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BblError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BblError::io(path, source))?;
    let size = file.metadata().map_or(0, |m| m.len());
    Ok((file, size))
}

/// `activity.jsonl` -> `activity.jsonl.3`
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ──────────────────────── tests ────────────────────────
