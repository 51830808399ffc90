//! Match results and the persisted target record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::fingerprint::Fingerprint;
use super::platform::{Language, Platform};
use super::signature::CandidateSignature;
use crate::error::{ResolverError, Result};

/// How a match was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every fingerprinted requirement matched bit-for-bit.
    Exact,
    /// Selected by secondary evidence without a fingerprint hit.
    Heuristic,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Exact => f.write_str("exact"),
            Confidence::Heuristic => f.write_str("heuristic"),
        }
    }
}

/// Outer wrapper a file's content was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    MacBinary,
    AppleSingle,
    DiskImage,
    PackedExecutable,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerKind::MacBinary => "macbinary",
            ContainerKind::AppleSingle => "applesingle",
            ContainerKind::DiskImage => "disk_image",
            ContainerKind::PackedExecutable => "packed_executable",
        };
        f.write_str(s)
    }
}

/// One file that contributed to a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFile {
    /// Requirement pattern this file satisfied.
    pub requirement: String,
    pub file_name: String,
    pub path: PathBuf,
    /// Effective size after unwrapping, if a wrapper was stripped.
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub signature: Arc<CandidateSignature>,
    /// Declaration order of the signature in its database; final tie-break.
    pub signature_index: usize,
    pub confidence: Confidence,
    pub resolved_language: Language,
    pub resolved_platform: Platform,
    pub evidence: Vec<MatchedFile>,
    #[serde(default)]
    pub corrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corruption_note: Option<String>,
}

impl MatchResult {
    pub fn game_id(&self) -> &str {
        &self.signature.game_id
    }

    pub fn is_exact(&self) -> bool {
        self.confidence == Confidence::Exact
    }

    pub fn evidence_file_count(&self) -> usize {
        self.evidence_paths().len()
    }

    /// Distinct paths backing this match.
    pub fn evidence_paths(&self) -> BTreeSet<&Path> {
        self.evidence.iter().map(|f| f.path.as_path()).collect()
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.evidence.iter().filter_map(|f| f.fingerprint.as_ref())
    }
}

/// The accepted identification, persisted as flat `key=value` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    #[serde(rename = "gameid")]
    pub game_id: String,
    pub language: Language,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    /// Canonical target name chosen by the namer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ResolvedTarget {
    pub fn from_match(result: &MatchResult) -> Self {
        Self {
            game_id: result.signature.game_id.clone(),
            language: result.resolved_language,
            platform: result.resolved_platform,
            extra: result.signature.variant_tag.clone(),
            target: None,
        }
    }

    pub fn key_values(&self) -> Vec<(&'static str, String)> {
        let mut kv = vec![
            ("gameid", self.game_id.clone()),
            ("language", self.language.code().to_string()),
            ("platform", self.platform.code().to_string()),
        ];
        if let Some(extra) = &self.extra {
            kv.push(("extra", extra.clone()));
        }
        if let Some(target) = &self.target {
            kv.push(("target", target.clone()));
        }
        kv
    }

    /// Fails on values the line format cannot carry back: line breaks and
    /// surrounding whitespace.
    pub fn to_config_string(&self) -> Result<String> {
        let mut out = String::new();
        for (key, value) in self.key_values() {
            if value.contains(['\n', '\r']) || value.trim() != value {
                return Err(ResolverError::Serialization(format!(
                    "{} value {:?} does not fit on one config line",
                    key, value
                )));
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push('\n');
        }
        Ok(out)
    }

    /// Parses `key=value` lines; blank lines and `#` comments are skipped,
    /// unknown keys are ignored.
    pub fn from_config_str(s: &str) -> Result<Self> {
        let mut game_id = None;
        let mut language = Language::Unknown;
        let mut platform = Platform::Unknown;
        let mut extra = None;
        let mut target = None;
        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                ResolverError::Serialization(format!("expected key=value, got '{}'", line))
            })?;
            let value = value.trim();
            match key.trim() {
                "gameid" => game_id = Some(value.to_string()),
                "language" => language = value.parse()?,
                "platform" => platform = value.parse()?,
                "extra" => extra = Some(value.to_string()),
                "target" => target = Some(value.to_string()),
                _ => {}
            }
        }
        let game_id = game_id
            .filter(|g| !g.is_empty())
            .ok_or_else(|| ResolverError::Serialization("missing gameid".to_string()))?;
        Ok(Self {
            game_id,
            language,
            platform,
            extra,
            target,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ResolverError::Serialization(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| ResolverError::Serialization(e.to_string()))
    }
}
