//! One-call config loading: resolve, read, parse, validate, snapshot.

use std::path::Path;

use crate::resolve::{resolve_config, ConfigPaths};
use crate::snapshot::ConfigSnapshot;
use crate::tracker::TrackerConfig;
use crate::validate::{validate_tracker_config, ValidationError};

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The validated tracker configuration.
    pub tracker: TrackerConfig,
    /// Where it came from.
    pub paths: ConfigPaths,
    /// Provenance snapshot.
    pub snapshot: ConfigSnapshot,
}

/// Resolve and load the tracker config, falling back to defaults.
///
/// A file that exists but fails to parse or validate is an error; a missing
/// file is not.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ValidationError> {
    let paths = resolve_config(cli_path);

    let Some(path) = paths.tracker.clone() else {
        let tracker = TrackerConfig::default();
        return Ok(LoadedConfig {
            tracker,
            paths,
            snapshot: ConfigSnapshot::defaults_only(),
        });
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let tracker = TrackerConfig::parse_json(&raw)?;
    validate_tracker_config(&tracker)?;

    let snapshot = ConfigSnapshot::new(&tracker, &paths, Some(&raw));
    Ok(LoadedConfig {
        tracker,
        paths,
        snapshot,
    })
}
