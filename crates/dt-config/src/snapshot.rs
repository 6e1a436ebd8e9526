//! Configuration snapshots for run provenance.
//!
//! A snapshot records which tracker config a run used, where it came from and
//! a content hash, so two reports can be checked for comparable bucket geometry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolve::{ConfigPaths, ConfigSource};
use crate::TrackerConfig;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// SHA-256 hash of the tracker JSON content (None for defaults).
    #[serde(default)]
    pub config_hash: Option<String>,

    /// Path the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the tracker configuration.
    pub config_source: String,

    /// Effective values.
    pub effective: TrackerConfig,
}

impl ConfigSnapshot {
    /// Create a snapshot from a loaded configuration and its raw content.
    pub fn new(config: &TrackerConfig, paths: &ConfigPaths, raw_json: Option<&str>) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            config_hash: raw_json.map(hash_content),
            config_path: paths.tracker.as_ref().map(|p| p.display().to_string()),
            config_source: paths.tracker_source.to_string(),
            effective: config.clone(),
        }
    }

    /// Create a snapshot with only defaults (no config file loaded).
    pub fn defaults_only() -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            config_hash: None,
            config_path: None,
            config_source: ConfigSource::BuiltinDefault.to_string(),
            effective: TrackerConfig::default(),
        }
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        match &self.config_hash {
            Some(hash) => &hash[..12.min(hash.len())],
            None => "default",
        }
    }
}

/// Compute SHA-256 hash of content.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
