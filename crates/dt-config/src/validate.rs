//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::tracker::{TrackerConfig, MAX_RETENTION_COUNT, SECONDS_PER_DAY};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate tracker configuration semantically.
pub fn validate_tracker_config(config: &TrackerConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.bucket_length_secs == 0 || config.bucket_length_secs > SECONDS_PER_DAY {
        return Err(ValidationError::InvalidValue {
            field: "bucket_length_secs".to_string(),
            message: format!(
                "Must be in [1, {}], got {}",
                SECONDS_PER_DAY, config.bucket_length_secs
            ),
        });
    }

    if config.retention_count == 0 {
        return Err(ValidationError::InvalidValue {
            field: "retention_count".to_string(),
            message: "Must keep at least one completed bucket".to_string(),
        });
    }

    if config.retention_count > MAX_RETENTION_COUNT {
        return Err(ValidationError::InvalidValue {
            field: "retention_count".to_string(),
            message: format!(
                "Must be at most {}, got {}",
                MAX_RETENTION_COUNT, config.retention_count
            ),
        });
    }

    if config.smoothing_window == 0 {
        return Err(ValidationError::InvalidValue {
            field: "smoothing_window".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    // A window wider than the retained history can never produce a point.
    if config.smoothing_window > config.retention_count {
        return Err(ValidationError::SemanticError(format!(
            "smoothing_window ({}) exceeds retention_count ({})",
            config.smoothing_window, config.retention_count
        )));
    }

    Ok(())
}
