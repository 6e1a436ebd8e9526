//! Tracker configuration: bucket geometry and smoothing.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Default bucket length: one hour.
pub const DEFAULT_BUCKET_LENGTH_SECS: u64 = 3_600;

/// Default number of completed buckets kept besides the in-progress one.
pub const DEFAULT_RETENTION_COUNT: usize = 24;

/// Upper bound on retained completed buckets (a year of hourly buckets).
pub const MAX_RETENTION_COUNT: usize = 8_760;

/// Default moving-average window, in buckets.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 6;

/// Seconds covered by the "last 24 hours" totals.
pub const SECONDS_PER_DAY: u64 = 86_400;

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_bucket_length_secs() -> u64 {
    DEFAULT_BUCKET_LENGTH_SECS
}

fn default_retention_count() -> usize {
    DEFAULT_RETENTION_COUNT
}

fn default_smoothing_window() -> usize {
    DEFAULT_SMOOTHING_WINDOW
}

/// Shape of the interval windows shared by the view and demo streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Schema version of this file.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Length of one bucket in seconds.
    #[serde(default = "default_bucket_length_secs")]
    pub bucket_length_secs: u64,

    /// Completed buckets retained behind the in-progress bucket.
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,

    /// Number of buckets averaged per moving-average point.
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            schema_version: default_schema_version(),
            bucket_length_secs: DEFAULT_BUCKET_LENGTH_SECS,
            retention_count: DEFAULT_RETENTION_COUNT,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl TrackerConfig {
    /// Load tracker config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse tracker config from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Bucket length as a chrono duration.
    ///
    /// Only meaningful for a validated config.
    pub fn bucket_length(&self) -> TimeDelta {
        TimeDelta::seconds(self.bucket_length_secs as i64)
    }

    /// Number of buckets covering 24 hours (at least one).
    pub fn daily_bucket_count(&self) -> usize {
        if self.bucket_length_secs == 0 {
            return 1;
        }
        ((SECONDS_PER_DAY / self.bucket_length_secs) as usize).max(1)
    }

    /// Window capacity: retained buckets plus the in-progress one.
    pub fn window_capacity(&self) -> usize {
        self.retention_count + 1
    }

    /// Set the bucket length in seconds.
    pub fn with_bucket_length_secs(mut self, secs: u64) -> Self {
        self.bucket_length_secs = secs;
        self
    }

    /// Set the retention count.
    pub fn with_retention_count(mut self, count: usize) -> Self {
        self.retention_count = count;
        self
    }

    /// Set the smoothing window.
    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }
}
