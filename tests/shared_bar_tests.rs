//! Shared bar under concurrent load, wired to the activity logger and loaded
//! from a configuration file.

mod common;

use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use barbell_balance::bar::Side;
use barbell_balance::bar::shared::SharedBar;
use barbell_balance::core::config::Config;
use barbell_balance::logger::activity::{ActivityLoggerConfig, spawn_logger};

use common::{disc, logger_config, read_events};

#[test]
fn concurrent_mixed_operations_keep_invariants() {
    let bar = SharedBar::new(common::bar(500));
    let start = Arc::new(Barrier::new(6));

    let workers: Vec<_> = (0..6_i64)
        .map(|i| {
            let bar = bar.clone();
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for j in 0..200_i64 {
                    let w = 1 + (i * 13 + j * 7) % 25;
                    let side = if (i + j) % 2 == 0 { Side::Left } else { Side::Right };
                    match j % 4 {
                        0 => {
                            let _ = bar.add(side, disc(w));
                        }
                        1 | 2 => {
                            let _ = bar.add_auto(disc(w));
                        }
                        _ => {
                            let _ = bar.remove(side);
                        }
                    }
                    let stats = bar.stats();
                    assert!(stats.total_load <= stats.capacity, "{stats:?}");
                    assert!(stats.imbalance < stats.tolerance, "{stats:?}");
                    assert_eq!(stats.left_load + stats.right_load, stats.total_load);
                }
            })
        })
        .collect();

    for w in workers {
        w.join().unwrap();
    }

    bar.inspect(|b| {
        let left: u64 = b.discs(Side::Left).iter().sum();
        let right: u64 = b.discs(Side::Right).iter().sum();
        assert_eq!(left + right, b.total_load());
        assert!(b.imbalance() < 20);
    });
}

#[test]
fn every_successful_mutation_is_logged_once() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, join) = spawn_logger(logger_config(dir.path())).unwrap();
    let bar = SharedBar::new(common::bar(10_000)).with_activity(handle.clone(), None);

    let workers: Vec<_> = (0..4_i64)
        .map(|i| {
            let bar = bar.clone();
            thread::spawn(move || {
                let mut added = 0_u64;
                for j in 0..50_i64 {
                    if bar.add_auto(disc(1 + (i + j) % 9)).is_ok() {
                        added += 1;
                    }
                }
                added
            })
        })
        .collect();
    let added: u64 = workers.into_iter().map(|w| w.join().unwrap()).sum();

    handle.shutdown();
    join.join().unwrap();
    assert_eq!(handle.dropped_events(), 0);

    let events = read_events(&dir.path().join("activity.jsonl"));
    assert_eq!(events[0]["event"], "bar_opened");
    let logged_adds = events.iter().filter(|e| e["event"] == "disc_added").count();
    assert_eq!(logged_adds as u64, added);
    assert_eq!(bar.stats().left_discs + bar.stats().right_discs, logged_adds);

    let last_add = events
        .iter()
        .rev()
        .find(|e| e["event"] == "disc_added")
        .unwrap();
    assert_eq!(last_add["total_load"], bar.total_load());
}

#[test]
fn bar_and_logger_built_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("logs").join("bar.jsonl");
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[bar]\ncapacity = 40\nimbalance_tolerance = 15\n\n[logging]\nenabled = true\n\n[paths]\njsonl_log = {:?}\n",
            log_path.display().to_string()
        ),
    )
    .unwrap();

    // Env overrides would change what this test observes.
    if std::env::vars().any(|(k, _)| k.starts_with("BBL_")) {
        return;
    }

    let config = Config::load(Some(config_path.as_path())).unwrap();
    assert!(config.logging.enabled);
    assert_eq!(config.paths.jsonl_log, log_path);

    let (handle, join) = spawn_logger(ActivityLoggerConfig::from(&config)).unwrap();
    let bar = SharedBar::from_config(&config)
        .unwrap()
        .with_activity(handle.clone(), Some(config.stable_hash().unwrap()));

    bar.add_left(disc(10)).unwrap();
    bar.add_right(disc(10)).unwrap();
    assert!(bar.add_left(disc(15)).is_err());
    assert!(bar.add_left(disc(25)).is_err());
    bar.add_left(disc(14)).unwrap();
    assert_eq!(bar.render(), "=10=14=|=============|=10=");

    handle.shutdown();
    join.join().unwrap();

    let events = read_events(&log_path);
    let codes: Vec<&str> = events
        .iter()
        .filter_map(|e| e["error_code"].as_str())
        .collect();
    assert_eq!(codes, vec!["BBL-2002", "BBL-2001"]);
    assert!(
        events[0]["details"]
            .as_str()
            .unwrap()
            .contains("config_hash=")
    );
}
