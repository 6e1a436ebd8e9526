//! Error types for Demo Tracker.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A recoverability hint
//!
//! Errors raised by analytics queries are local and expected (an unknown user,
//! too little history, no conversions yet). They are logged where they occur
//! and returned to the caller; none of them abort the process.
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 31,
//!   "category": "analytics",
//!   "message": "no predictive signal: views=120, demos=0",
//!   "recoverable": true,
//!   "context": { "total_views": 120, "total_demos": 0 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for Demo Tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Event ingestion errors.
    Ingest,
    /// Aggregation, smoothing and prediction errors.
    Analytics,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingest => write!(f, "ingest"),
            ErrorCategory::Analytics => write!(f, "analytics"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Demo Tracker.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),

    // Ingestion errors (20-29)
    #[error("user {user_id} not found (no view recorded before demo)")]
    UserNotFound { user_id: String },

    #[error("invalid event at line {line}: {message}")]
    InvalidEvent { line: usize, message: String },

    // Analytics errors (30-39)
    #[error(
        "insufficient data: duration {requested} with smoothing window {smoothing_window} needs more than {available} buckets"
    )]
    InsufficientData {
        requested: usize,
        smoothing_window: usize,
        available: usize,
    },

    #[error("no predictive signal: views={total_views}, demos={total_demos}")]
    NoSignal { total_views: u64, total_demos: u64 },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingestion errors
    /// - 30-39: Analytics errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::UserNotFound { .. } => 20,
            Error::InvalidEvent { .. } => 21,
            Error::InsufficientData { .. } => 30,
            Error::NoSignal { .. } => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::UserNotFound { .. } | Error::InvalidEvent { .. } => ErrorCategory::Ingest,
            Error::InsufficientData { .. } | Error::NoSignal { .. } => ErrorCategory::Analytics,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Analytics errors clear up by themselves once more events arrive.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::InvalidConfig(_) => true,

            // The demo is attributed to nobody; re-sending it won't help.
            Error::UserNotFound { .. } => false,
            Error::InvalidEvent { .. } => false,

            Error::InsufficientData { .. } => true,
            Error::NoSignal { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig(_) => "Invalid Tracker Configuration",
            Error::UserNotFound { .. } => "User Not Found",
            Error::InvalidEvent { .. } => "Invalid Event",
            Error::InsufficientData { .. } => "Insufficient Data",
            Error::NoSignal { .. } => "No Predictive Signal",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., user_id, bucket counts).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UserNotFound { user_id } => {
                context.insert("user_id".to_string(), serde_json::json!(user_id));
            }
            Error::InvalidEvent { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::InsufficientData {
                requested,
                smoothing_window,
                available,
            } => {
                context.insert("requested".to_string(), serde_json::json!(requested));
                context.insert(
                    "smoothing_window".to_string(),
                    serde_json::json!(smoothing_window),
                );
                context.insert("available".to_string(), serde_json::json!(available));
            }
            Error::NoSignal {
                total_views,
                total_demos,
            } => {
                context.insert("total_views".to_string(), serde_json::json!(total_views));
                context.insert("total_demos".to_string(), serde_json::json!(total_demos));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
