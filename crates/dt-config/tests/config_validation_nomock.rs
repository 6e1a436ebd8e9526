//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Loading real tracker.json files from disk
//! - Resolution order (CLI > env file > env dir)
//! - Validation failures surfacing through load_config

use dt_config::resolve::{resolve_config, ConfigSource, ENV_CONFIG_DIR, ENV_CONFIG_PATH};
use dt_config::{load_config, TrackerConfig, ValidationError};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_tracker(dir: &Path, json: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir).expect("create config dir");
    let path = dir.join("tracker.json");
    fs::write(&path, json).expect("write tracker.json");
    path
}

#[test]
fn test_load_config_from_cli_path() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let path = write_tracker(
            temp.path(),
            r#"{"schema_version": "1.0.0", "bucket_length_secs": 60, "retention_count": 30, "smoothing_window": 5}"#,
        );

        let loaded = load_config(Some(&path)).expect("valid config should load");
        assert_eq!(loaded.paths.tracker_source, ConfigSource::CliArgument);
        assert_eq!(loaded.tracker.bucket_length_secs, 60);
        assert_eq!(loaded.tracker.retention_count, 30);
        assert_eq!(loaded.tracker.smoothing_window, 5);
        assert!(loaded.snapshot.config_hash.is_some());
    });
}

#[test]
fn test_resolve_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let cli = write_tracker(&temp.path().join("cli"), "{}");
        let from_env = write_tracker(&temp.path().join("env"), "{}");
        env::set_var(ENV_CONFIG_PATH, from_env.display().to_string());

        let paths = resolve_config(Some(&cli));
        assert_eq!(paths.tracker_source, ConfigSource::CliArgument);
        assert_eq!(paths.tracker.unwrap(), cli);
    });
}

#[test]
fn test_resolve_env_path_over_env_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let direct = write_tracker(&temp.path().join("direct"), "{}");
        let dir = temp.path().join("dir");
        write_tracker(&dir, "{}");
        env::set_var(ENV_CONFIG_PATH, direct.display().to_string());
        env::set_var(ENV_CONFIG_DIR, dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.tracker_source, ConfigSource::Environment);
        assert_eq!(paths.tracker.unwrap(), direct);
    });
}

#[test]
fn test_resolve_env_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let dir = temp.path().join("dir");
        let path = write_tracker(&dir, "{}");
        env::set_var(ENV_CONFIG_DIR, dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.tracker_source, ConfigSource::Environment);
        assert_eq!(paths.tracker.unwrap(), path);
    });
}

#[test]
fn test_load_config_rejects_invalid_values() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let path = write_tracker(temp.path(), r#"{"retention_count": 0}"#);

        let err = load_config(Some(&path)).expect_err("zero retention must fail");
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    });
}

#[test]
fn test_load_config_rejects_oversized_retention() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let path = write_tracker(temp.path(), r#"{"retention_count": 1099511627776}"#);

        let err = load_config(Some(&path)).expect_err("oversized retention must fail");
        match err {
            ValidationError::InvalidValue { field, .. } => assert_eq!(field, "retention_count"),
            other => panic!("unexpected error: {other:?}"),
        }
    });
}

#[test]
fn test_load_config_rejects_malformed_json() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let temp = TempDir::new().expect("temp dir");
        let path = write_tracker(temp.path(), "{\"retention_count\": ");

        let err = load_config(Some(&path)).expect_err("truncated JSON must fail");
        assert!(matches!(err, ValidationError::ParseError(_)));
    });
}

#[test]
fn test_file_roundtrip_matches_defaults() {
    let temp = TempDir::new().expect("temp dir");
    let json = serde_json::to_string_pretty(&TrackerConfig::default()).expect("serialize");
    let path = write_tracker(temp.path(), &json);
    let back = TrackerConfig::from_file(&path).expect("read back");
    assert_eq!(back, TrackerConfig::default());
}
