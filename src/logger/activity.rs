//! Background activity logger: a dedicated thread owns the `JsonlWriter`.
//!
//! Callers hold an `ActivityLoggerHandle` and send `ActivityEvent`s through a
//! bounded crossbeam channel with `try_send`, so a bar mutation is never held
//! up by logging back-pressure. Events that do not fit are counted, and the
//! count is written out by the logger thread on its next event.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::bar::Side;
use crate::core::config::Config;
use crate::core::errors::{BblError, Result};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Default bounded channel capacity for activity events.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Something that happened to a bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    BarOpened {
        capacity: u64,
        tolerance: u64,
        config_hash: Option<String>,
    },
    DiscAdded {
        side: Side,
        weight: u64,
        total_load: u64,
        imbalance: u64,
    },
    AddRejected {
        side: Option<Side>,
        weight: u64,
        code: String,
        message: String,
    },
    DiscRemoved {
        side: Side,
        weight: u64,
        total_load: u64,
        imbalance: u64,
    },
    RemoveRejected {
        side: Side,
        code: String,
        message: String,
    },
    /// Ask the logger thread to flush and exit.
    Shutdown,
}

/// Cheaply cloneable, thread-safe sender of activity events.
#[derive(Debug, Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Queue an event without blocking. A full channel drops the event.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Events dropped since the logger thread last reported them.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and stop. Blocks only until the
    /// request is queued; join the thread handle to wait for the flush.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

/// Options for the logger thread.
#[derive(Debug, Clone)]
pub struct ActivityLoggerConfig {
    pub jsonl: JsonlConfig,
    pub channel_capacity: usize,
}

impl Default for ActivityLoggerConfig {
    fn default() -> Self {
        Self {
            jsonl: JsonlConfig::default(),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

impl From<&Config> for ActivityLoggerConfig {
    fn from(config: &Config) -> Self {
        Self {
            jsonl: JsonlConfig {
                path: config.paths.jsonl_log.clone(),
                fallback_path: config.paths.jsonl_fallback.clone(),
                max_size_bytes: config.logging.max_size_bytes,
                max_rotated_files: config.logging.max_rotated_files,
                fsync_interval_secs: config.logging.fsync_interval_secs,
            },
            channel_capacity: config.logging.channel_capacity,
        }
    }
}

/// Start the logger thread.
///
/// It runs until `shutdown()` is called or every handle has been dropped.
pub fn spawn_logger(
    config: ActivityLoggerConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(config.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: Arc::clone(&dropped),
    };

    let jsonl = config.jsonl;
    let join = thread::Builder::new()
        .name("bbl-logger".to_string())
        .spawn(move || logger_thread_main(&rx, jsonl, &dropped))
        .map_err(|e| BblError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<ActivityEvent>, jsonl: JsonlConfig, dropped: &AtomicU64) {
    let mut writer = JsonlWriter::open(jsonl);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let mut warn = LogEntry::new(EventType::LoggerNotice, Severity::Warning);
            warn.details = Some(format!("{d} activity events dropped due to back-pressure"));
            writer.write_entry(&warn);
        }

        let Some(entry) = event_to_log_entry(&event) else {
            break;
        };
        writer.write_entry(&entry);
    }

    writer.fsync();
}

/// `None` for `Shutdown`, which ends the logger loop instead of being logged.
fn event_to_log_entry(event: &ActivityEvent) -> Option<LogEntry> {
    let entry = match event {
        ActivityEvent::BarOpened {
            capacity,
            tolerance,
            config_hash,
        } => {
            let mut e = LogEntry::new(EventType::BarOpened, Severity::Info);
            e.capacity = Some(*capacity);
            e.details = Some(match config_hash {
                Some(hash) => format!("tolerance={tolerance} config_hash={hash}"),
                None => format!("tolerance={tolerance}"),
            });
            e.ok = Some(true);
            e
        }
        ActivityEvent::DiscAdded {
            side,
            weight,
            total_load,
            imbalance,
        } => {
            let mut e = LogEntry::new(EventType::DiscAdded, Severity::Info);
            e.side = Some(*side);
            e.weight = Some(*weight);
            e.total_load = Some(*total_load);
            e.imbalance = Some(*imbalance);
            e.ok = Some(true);
            e
        }
        ActivityEvent::DiscRemoved {
            side,
            weight,
            total_load,
            imbalance,
        } => {
            let mut e = LogEntry::new(EventType::DiscRemoved, Severity::Info);
            e.side = Some(*side);
            e.weight = Some(*weight);
            e.total_load = Some(*total_load);
            e.imbalance = Some(*imbalance);
            e.ok = Some(true);
            e
        }
        ActivityEvent::AddRejected {
            side,
            weight,
            code,
            message,
        } => {
            let mut e = LogEntry::new(EventType::AddRejected, Severity::Warning);
            e.side = *side;
            e.weight = Some(*weight);
            e.ok = Some(false);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e
        }
        ActivityEvent::RemoveRejected {
            side,
            code,
            message,
        } => {
            let mut e = LogEntry::new(EventType::RemoveRejected, Severity::Warning);
            e.side = Some(*side);
            e.ok = Some(false);
            e.error_code = Some(code.clone());
            e.error_message = Some(message.clone());
            e
        }
        ActivityEvent::Shutdown => return None,
    };
    Some(entry)
}
