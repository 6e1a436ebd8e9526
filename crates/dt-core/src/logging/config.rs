//! Log filter and format resolution.
//!
//! Precedence, highest first: `--log-level`, `DT_LOG`, `RUST_LOG`, then
//! `dt_core=info`. `DT_LOG` and `RUST_LOG` accept full `EnvFilter`
//! directives; a bare level is scoped to this crate. Values that do not parse
//! are skipped so the next source applies.

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Directives used when nothing else is configured.
pub const DEFAULT_DIRECTIVES: &str = "dt_core=info";

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format '{}', expected human or jsonl", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Resolved logging setup for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, already checked to parse.
    pub directives: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            directives: DEFAULT_DIRECTIVES.to_string(),
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(|name| std::env::var(name).ok(), cli_level, cli_format)
    }

    /// Resolve with an explicit variable lookup.
    pub fn resolve<F>(
        lookup: F,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let directives = cli_level
            .map(scoped)
            .or_else(|| lookup("DT_LOG").and_then(|v| directives_from(&v)))
            .or_else(|| lookup("RUST_LOG").and_then(|v| directives_from(&v)))
            .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string());

        let format = cli_format
            .or_else(|| lookup("DT_LOG_FORMAT").and_then(|v| v.parse().ok()))
            .unwrap_or_default();

        LogConfig { format, directives }
    }

    /// Build the subscriber filter.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    }
}

fn scoped(level: LevelFilter) -> String {
    format!("dt_core={}", level.to_string().to_ascii_lowercase())
}

fn directives_from(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(level) = value.parse::<LevelFilter>() {
        return Some(scoped(level));
    }
    EnvFilter::try_new(value).ok().map(|_| value.to_string())
}
