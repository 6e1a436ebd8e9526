//! JSONL trace output for tests.
//!
//! Each test process appends to `target/test-logs/dt-core-tests-<pid>.jsonl`
//! so failures in store or replay scenarios can be inspected after the run.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::logging::LogEvent;

fn log_file_path() -> PathBuf {
    let target = std::env::var("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(env!("CARGO_MANIFEST_DIR")).join("../../target"));
    target
        .join("test-logs")
        .join(format!("dt-core-tests-{}.jsonl", std::process::id()))
}

fn append_line(line: &str) {
    let path = log_file_path();
    let result = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path))
        .and_then(|mut file| file.write_all(format!("{}\n", line).as_bytes()));
    if let Err(err) = result {
        eprintln!("test_log: cannot write {}: {}", path.display(), err);
    }
}

/// Append one structured entry.
pub fn log_event(level: &str, msg: &str, file: &str, line: u32, fields: &[(&str, Value)]) {
    let mut map = Map::new();
    map.insert(
        "ts".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
    );
    map.insert("level".to_string(), Value::String(level.to_string()));
    map.insert("msg".to_string(), Value::String(msg.to_string()));
    map.insert("file".to_string(), Value::String(file.to_string()));
    map.insert("line".to_string(), Value::from(line));
    map.insert(
        "test".to_string(),
        Value::String(
            std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string(),
        ),
    );

    for (key, value) in fields {
        let key = if map.contains_key(*key) {
            format!("extra_{}", key)
        } else {
            (*key).to_string()
        };
        map.insert(key, value.clone());
    }

    match serde_json::to_string(&Value::Object(map)) {
        Ok(line) => append_line(&line),
        Err(err) => eprintln!("test_log: failed to serialize entry: {}", err),
    }
}

/// Copy diagnostics captured by a `MemorySink` into the test log.
pub fn dump_events(events: &[LogEvent], file: &str, line: u32) {
    for event in events {
        log_event(
            &event.level.to_string().to_uppercase(),
            &event.message,
            file,
            line,
            &[
                ("event", Value::String(event.event.clone())),
                ("stage", Value::String(event.stage.to_string())),
                (
                    "fields",
                    Value::Object(event.fields.clone().into_iter().collect()),
                ),
            ],
        );
    }
}

#[macro_export]
macro_rules! test_log {
    ($level:ident, $msg:expr $(, $key:ident = $val:expr )* $(,)?) => {{
        let fields = vec![
            $(
                (stringify!($key), serde_json::json!($val)),
            )*
        ];
        $crate::test_log::log_event(stringify!($level), &$msg.to_string(), file!(), line!(), &fields);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{event_names, Stage};

    fn entries_with(msg: &str) -> Vec<Value> {
        let content = fs::read_to_string(log_file_path()).unwrap_or_default();
        content
            .lines()
            .filter_map(|l| serde_json::from_str::<Value>(l).ok())
            .filter(|v| v["msg"] == msg)
            .collect()
    }

    #[test]
    fn test_log_event_is_appended() {
        log_event("INFO", "test-log-append", "test_log.rs", 7, &[("bucket", Value::from(3))]);
        let entries = entries_with("test-log-append");
        assert!(!entries.is_empty());
        assert_eq!(entries[0]["level"], "INFO");
        assert_eq!(entries[0]["bucket"], 3);
        assert_eq!(entries[0]["line"], 7);
    }

    #[test]
    fn test_reserved_keys_are_prefixed() {
        log_event("WARN", "test-log-reserved", "f.rs", 1, &[("level", Value::from("x"))]);
        let entries = entries_with("test-log-reserved");
        assert_eq!(entries[0]["level"], "WARN");
        assert_eq!(entries[0]["extra_level"], "x");
    }

    #[test]
    fn test_dump_events() {
        let event = LogEvent::warn(event_names::PREDICT_NO_SIGNAL, Stage::Predict, "test-log-dump")
            .with_field("total_views", 0);
        dump_events(&[event], "f.rs", 2);
        let entries = entries_with("test-log-dump");
        assert_eq!(entries[0]["event"], "predict.no_signal");
        assert_eq!(entries[0]["fields"]["total_views"], 0);
    }

    #[test]
    fn test_macro() {
        crate::test_log!(INFO, "test-log-macro", window = 6);
        let entries = entries_with("test-log-macro");
        assert_eq!(entries[0]["window"], 6);
    }
}
