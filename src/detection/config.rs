//! Configuration for a resolver run.
//!
//! All sections have defaults, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{Language, Platform};
use crate::error::{ResolverError, Result};

/// Master configuration for the detection pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Directory walking.
    pub collector: CollectorConfig,
    /// Content reads and fingerprint diagnostics.
    pub fingerprint: FingerprintConfig,
    /// Matching policy.
    pub matching: MatchingConfig,
    /// Explicit user hints applied when reducing results.
    pub overrides: Overrides,
}

impl ResolverConfig {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ResolverError::Serialization(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ResolverError::Serialization(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Directory walking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Depth limit; root entries are at depth 1.
    pub max_depth: usize,
    /// Case-insensitive globs a subdirectory name must match to be entered.
    pub directory_globs: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            directory_globs: vec![
                "resource".into(),
                "resources".into(),
                "rooms *".into(),
                "data".into(),
                "game data".into(),
                "*.app".into(),
                "contents".into(),
                "macos".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Load candidate file prefixes on a thread pool before matching.
    pub parallel_prefetch: bool,
    /// Emit a report (and a warning) for each unknown detection file.
    pub report_unknown: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            parallel_prefetch: false,
            report_unknown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Run the secondary-evidence battery for unresolved families.
    pub allow_heuristic: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            allow_heuristic: true,
        }
    }
}

/// Explicit language/platform hints, typically from a saved target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub language: Option<Language>,
    pub platform: Option<Platform>,
}
