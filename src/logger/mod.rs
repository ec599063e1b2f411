//! Activity logging: JSONL append-only writer fed by a background thread.

pub mod activity;
pub mod jsonl;
