#![allow(dead_code)]

use std::path::Path;

use barbell_balance::bar::accumulator::BalanceAccumulator;
use barbell_balance::bar::disc::Disc;
use barbell_balance::logger::activity::ActivityLoggerConfig;
use barbell_balance::logger::jsonl::JsonlConfig;

pub fn disc(weight: i64) -> Disc {
    Disc::new(weight).expect("test disc weight must be positive")
}

pub fn bar(capacity: i64) -> BalanceAccumulator {
    BalanceAccumulator::new(capacity).expect("test capacity must be positive")
}

pub fn logger_config(dir: &Path) -> ActivityLoggerConfig {
    ActivityLoggerConfig {
        jsonl: JsonlConfig {
            path: dir.join("activity.jsonl"),
            fallback_path: None,
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
            fsync_interval_secs: 60,
        },
        channel_capacity: 4096,
    }
}

pub fn read_events(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .expect("read activity log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("activity line is JSON"))
        .collect()
}
