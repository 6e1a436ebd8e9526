//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! Every event carries a stable name, a stage and free-form key/value fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Processing stages in the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Recording views and demos.
    Ingest,
    /// Window eviction and fill.
    Rotate,
    /// Last-N totals.
    Aggregate,
    /// Moving averages.
    Smooth,
    /// Conversion predictor.
    Predict,
    /// Offline replay of an event log.
    Replay,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Rotate => "rotate",
            Stage::Aggregate => "aggregate",
            Stage::Smooth => "smooth",
            Stage::Predict => "predict",
            Stage::Replay => "replay",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Ingest
    pub const INGEST_USER_CREATED: &str = "ingest.user_created";
    pub const INGEST_VIEW_RECORDED: &str = "ingest.view_recorded";
    pub const INGEST_DEMO_RECORDED: &str = "ingest.demo_recorded";
    pub const INGEST_USER_NOT_FOUND: &str = "ingest.user_not_found";
    pub const INGEST_DEMO_ALREADY_PROCESSED: &str = "ingest.demo_already_processed";

    // Rotate
    pub const ROTATE_APPLIED: &str = "rotate.applied";
    pub const ROTATE_CLOCK_BEHIND: &str = "rotate.clock_behind";

    // Smooth
    pub const SMOOTH_DURATION_TRUNCATED: &str = "smooth.duration_truncated";
    pub const SMOOTH_INSUFFICIENT_DATA: &str = "smooth.insufficient_data";

    // Predict
    pub const PREDICT_NO_SIGNAL: &str = "predict.no_signal";
    pub const PREDICT_BRANCH_SKIPPED: &str = "predict.branch_skipped";
    pub const PREDICT_RANKED: &str = "predict.ranked";

    // Replay
    pub const REPLAY_EVENT_REJECTED: &str = "replay.event_rejected";

    // Errors
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub level: Level,

    /// Event name (e.g., "ingest.user_not_found").
    pub event: String,

    /// Unique ID for this invocation, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    pub stage: Stage,

    /// Human-readable message.
    pub message: String,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEvent {
    /// Create a new log event with required fields.
    pub fn new(
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: None,
            stage,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn trace(
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Level::Trace, event, stage, message)
    }

    pub fn info(event: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Info, event, stage, message)
    }

    pub fn debug(event: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Debug, event, stage, message)
    }

    pub fn warn(event: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Warn, event, stage, message)
    }

    pub fn error(event: impl Into<String>, stage: Stage, message: impl Into<String>) -> Self {
        Self::new(Level::Error, event, stage, message)
    }

    /// Set the run ID.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::warn(
            event_names::SMOOTH_DURATION_TRUNCATED,
            Stage::Smooth,
            "duration too long for available data",
        )
        .with_run_id("run-12345")
        .with_field("duration", 30)
        .with_field("window", 6);

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"smooth.duration_truncated""#));
        assert!(json.contains(r#""level":"warn""#));
        assert!(json.contains(r#""stage":"smooth""#));
        assert!(json.contains(r#""run_id":"run-12345""#));
        assert!(json.contains(r#""duration":30"#));
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let event = LogEvent::info(event_names::RUN_STARTED, Stage::Init, "starting");
        let json = event.to_jsonl();
        assert!(!json.contains("fields"));
        assert!(!json.contains("run_id"));
    }

    #[test]
    fn test_field_lookup() {
        let event = LogEvent::error(event_names::INGEST_USER_NOT_FOUND, Stage::Ingest, "no view")
            .with_field("user_id", "ghost");
        assert_eq!(event.field("user_id"), Some(&serde_json::json!("ghost")));
        assert_eq!(event.field("missing"), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Rotate.to_string(), "rotate");
        assert_eq!(Stage::Predict.to_string(), "predict");
        assert_eq!(serde_json::to_string(&Stage::Smooth).unwrap(), "\"smooth\"");
    }

    #[test]
    fn test_level_from_tracing() {
        assert_eq!(Level::from(tracing::Level::INFO), Level::Info);
        assert_eq!(Level::from(tracing::Level::WARN), Level::Warn);
        assert!(Level::Error > Level::Warn);
    }
}
