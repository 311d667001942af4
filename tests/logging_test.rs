//! The configured logging level gates what the grouping engine emits

use std::sync::Mutex;

use groupwise::config::LoggingConfig;
use groupwise::{col, Column, DataFrame, GroupwiseConfig};
use log::{Level, LevelFilter, Log, Metadata, Record};

struct Capture {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("groupwise")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut records = self.records.lock().unwrap();
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    records: Mutex::new(Vec::new()),
};

fn drain() -> Vec<(Level, String)> {
    std::mem::take(&mut *CAPTURE.records.lock().unwrap())
}

fn with_level(level: &str) -> GroupwiseConfig {
    let mut config = GroupwiseConfig::default();
    config.logging.level = level.to_string();
    config
}

#[test]
fn test_level_enabled() {
    let config = LoggingConfig {
        level: "debug".to_string(),
    };
    assert!(config.enabled(Level::Warn));
    assert!(config.enabled(Level::Debug));
    assert!(!config.enabled(Level::Trace));

    let off = LoggingConfig {
        level: "off".to_string(),
    };
    assert!(!off.enabled(Level::Error));

    // unparseable levels fall back to info
    let bad = LoggingConfig {
        level: "loud".to_string(),
    };
    assert!(bad.enabled(Level::Info));
    assert!(!bad.enabled(Level::Debug));
}

#[test]
fn test_config_level_gates_records() {
    log::set_logger(&CAPTURE).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let df = DataFrame::from_columns(vec![
        ("k", Column::from_strs(&["a", "b", "a"])),
        ("v", Column::from_i64(vec![1, 2, 3])),
    ])
    .unwrap();

    let run = |level: &str| {
        drain();
        df.group_by(&["k"], true)
            .unwrap()
            .with_config(with_level(level))
            .agg([col("v").sum()])
            .unwrap();
        drain()
    };

    assert!(run("off").is_empty());
    assert!(run("info").is_empty());

    let debug = run("debug");
    assert!(debug.iter().any(|(_, msg)| msg.contains("grouped 3 rows")));
    assert!(debug.iter().all(|(level, _)| *level <= Level::Debug));
}
