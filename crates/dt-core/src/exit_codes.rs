//! Exit codes for the dt-core CLI.
//!
//! Exit code ranges:
//! - 0-9: operational outcomes (read the outcome from the code, not the output)
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors

use dt_common::{Error, ErrorCategory};

/// Exit codes for dt-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Report produced with a predictor.
    Clean = 0,

    /// Report produced, but the data holds no predictive signal yet.
    NoSignal = 1,

    /// Invalid arguments or malformed event log.
    ArgsError = 10,

    /// Config file unreadable, unparsable or invalid.
    ConfigError = 11,

    /// Internal error (bug).
    InternalError = 20,

    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::NoSignal)
    }

    /// User/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NoSignal => "OK_NO_SIGNAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Map a library error to the exit code a command should return.
    pub fn from_error(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Ingest => ExitCode::ArgsError,
            ErrorCategory::Analytics => match err {
                Error::NoSignal { .. } => ExitCode::NoSignal,
                _ => ExitCode::ArgsError,
            },
            ErrorCategory::Io => match err {
                Error::Json(_) => ExitCode::ArgsError,
                _ => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
