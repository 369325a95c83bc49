//! Configuration snapshots for reproducible audit output.
//!
//! A snapshot records the effective configuration of a run together with
//! where it came from and content hashes, so two outputs can be checked for
//! having been produced under the same settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::audit::AuditConfig;
use crate::resolve::ConfigSource;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Source of the configuration.
    pub source: String,

    /// Path the config file was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// SHA-256 of the raw config file content.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 of the effective configuration, after overrides.
    pub effective_hash: String,

    /// Effective configuration values.
    pub effective: AuditConfig,
}

impl ConfigSnapshot {
    pub fn new(
        effective: &AuditConfig,
        source: ConfigSource,
        path: Option<&Path>,
        content: Option<&str>,
    ) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            source: source.to_string(),
            path: path.map(|p| p.display().to_string()),
            file_hash: content.map(hash_content),
            effective_hash: hash_config(effective),
            effective: effective.clone(),
        }
    }

    /// Create a snapshot of the built-in defaults.
    pub fn defaults_only() -> Self {
        Self::new(
            &AuditConfig::default(),
            ConfigSource::BuiltinDefault,
            None,
            None,
        )
    }

    /// Serialize snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if this snapshot describes the same effective config as another.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

fn hash_config(config: &AuditConfig) -> String {
    hash_content(&serde_json::to_string(config).unwrap_or_default())
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
