//! Sync-core configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::SyncError;

/// Configuration for the sync core.
///
/// Can be loaded from a TOML file via [`SyncConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How long (in milliseconds) a peer's announced score stays in the
    /// table without a fresher announcement before it expires.
    #[serde(default = "default_score_ttl_ms")]
    pub score_ttl_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_score_ttl_ms() -> u64 {
    90_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SyncError> {
        toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("SyncConfig is always serializable to TOML")
    }

    /// The score TTL as a [`Duration`].
    pub fn score_ttl(&self) -> Duration {
        Duration::from_millis(self.score_ttl_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            score_ttl_ms: default_score_ttl_ms(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
