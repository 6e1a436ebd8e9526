//! Structured logging for the tracker.
//!
//! Two output modes:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for pipelines
//!
//! Library code never logs through `tracing` directly. It emits `LogEvent`s
//! into a `DiagnosticSink`; the binary installs a `TracingSink` so those
//! events reach the subscriber configured here.
//!
//! stdout is reserved for command payloads. All log output goes to stderr.

pub mod config;
pub mod events;
pub mod layer;
pub mod sink;

pub use config::{LogConfig, LogFormat, DEFAULT_DIRECTIVES};
pub use events::{event_names, Level, LogEvent, Stage};
pub use layer::JsonlLayer;
pub use sink::{DiagnosticSink, MemorySink, NullSink, TracingSink};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::fmt;

/// Initialize the logging subsystem.
///
/// Call once at startup with a config from `LogConfig::from_env`. A second
/// call leaves the first subscriber in place.
pub fn init_logging(config: &LogConfig) {
    let filter = config.env_filter();

    let result = match config.format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .try_init(),
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::stderr())
            .try_init(),
    };

    if let Err(err) = result {
        eprintln!("dt-core: logging already initialized: {}", err);
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();

        assert!(id1.starts_with("run-"));
        assert_ne!(id1, id2);
        // run-<12 hex chars>
        assert_eq!(id1.len(), 16);
        assert!(id1[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.directives, DEFAULT_DIRECTIVES);
    }
}
