//! Demo Tracker configuration loading and validation.
//!
//! This crate provides:
//! - The typed `TrackerConfig` (bucket length, retention, smoothing)
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Config snapshots with content hashes for run provenance

pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod tracker;
pub mod validate;

pub use load::{load_config, LoadedConfig};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use tracker::{TrackerConfig, MAX_RETENTION_COUNT};
pub use validate::{validate_tracker_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
