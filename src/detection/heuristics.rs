//! Secondary-evidence disambiguation for deferred signatures.
//!
//! Deferred candidates are grouped into families by detection filename and
//! run through an ordered battery of exclusion tests: version gates, header
//! magic, sibling-file truth tables and structural exceptions. Tests only
//! ever remove candidates; whatever survives is reported with heuristic
//! confidence, all of it when more than one remains.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, trace};

use super::evidence::NameMap;
use super::matcher::DeferredCandidate;
use super::patterns::substitute_index;
use crate::core::{
    CandidateSignature, Confidence, DetectionIssue, DetectionIssueKind, FeatureFlags, MatchResult,
    Platform,
};

/// Which signatures a test keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Admission {
    /// Empty admits every game id.
    pub game_ids: Vec<String>,
    pub min_version: Option<u8>,
    pub max_version: Option<u8>,
    pub platform: Option<Platform>,
    pub require_flags: FeatureFlags,
    pub forbid_flags: FeatureFlags,
}

impl Admission {
    pub fn admits(&self, sig: &CandidateSignature) -> bool {
        if !self.game_ids.is_empty()
            && !self.game_ids.iter().any(|g| g.eq_ignore_ascii_case(&sig.game_id))
        {
            return false;
        }
        if self.min_version.is_some_and(|v| sig.engine_version < v)
            || self.max_version.is_some_and(|v| sig.engine_version > v)
        {
            return false;
        }
        if self.platform.is_some_and(|p| p != sig.platform) {
            return false;
        }
        sig.flags.contains(self.require_flags) && !sig.flags.intersects(self.forbid_flags)
    }
}

/// Leading-bytes test on a family's detection file. The first rule whose
/// magic is found decides which signatures may stay; a header no rule
/// recognizes excludes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub family: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(with = "hex::serde")]
    pub magic: Vec<u8>,
    pub admit: Admission,
}

impl HeaderRule {
    pub fn matches(&self, header: &[u8]) -> bool {
        let Some(end) = self.offset.checked_add(self.magic.len()) else {
            return false;
        };
        header
            .get(self.offset..end)
            .is_some_and(|bytes| bytes == self.magic.as_slice())
    }
}

/// Engine generations a detection file can belong to. A gate without
/// families applies to every family that has no gate of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionGate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub families: Vec<String>,
    #[serde(default)]
    pub min_version: Option<u8>,
    #[serde(default)]
    pub max_version: Option<u8>,
}

impl VersionGate {
    /// Signatures without an engine generation are never gated.
    pub fn admits(&self, sig: &CandidateSignature) -> bool {
        if sig.engine_version == 0 {
            return true;
        }
        self.min_version.map_or(true, |v| sig.engine_version >= v)
            && self.max_version.map_or(true, |v| sig.engine_version <= v)
    }
}

/// Files that must and must not sit next to the detection file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiblingClause {
    pub present: Vec<String>,
    pub absent: Vec<String>,
}

impl SiblingClause {
    pub fn holds(&self, map: &NameMap) -> bool {
        self.present.iter().all(|f| map.contains(f)) && !self.absent.iter().any(|f| map.contains(f))
    }
}

/// Presence/absence truth table for one game in one family. The game is kept
/// if any clause holds. Games without a rule are not affected, nor are
/// signatures lacking any of `only_flags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingRule {
    pub family: String,
    pub game_id: String,
    pub clauses: Vec<SiblingClause>,
    #[serde(default)]
    pub only_flags: FeatureFlags,
}

impl SiblingRule {
    fn excludes(&self, sig: &CandidateSignature, map: &NameMap) -> bool {
        sig.game_id.eq_ignore_ascii_case(&self.game_id)
            && sig.flags.contains(self.only_flags)
            && !self.clauses.iter().any(|c| c.holds(map))
    }
}

/// Bespoke tests for titles whose layout defeats the generic tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralException {
    /// The demo and the full game share a detection file; the demo is the one
    /// without `marker`.
    DemoBySibling {
        family: String,
        game_id: String,
        marker: String,
    },
    /// Variants told apart by how many numbered siblings exist.
    VariantBySiblingCount {
        family: String,
        game_id: String,
        /// printf-style pattern, e.g. `disk%02d.lec`.
        pattern: String,
        first: u32,
        last: u32,
        threshold: usize,
        /// Variants kept when at least `threshold` siblings exist.
        at_least: Vec<String>,
        /// Variants kept otherwise.
        below: Vec<String>,
    },
}

impl StructuralException {
    fn family(&self) -> &str {
        match self {
            StructuralException::DemoBySibling { family, .. }
            | StructuralException::VariantBySiblingCount { family, .. } => family,
        }
    }

    fn keeps(&self, sig: &CandidateSignature, map: &NameMap) -> bool {
        match self {
            StructuralException::DemoBySibling { game_id, marker, .. } => {
                if !sig.game_id.eq_ignore_ascii_case(game_id) {
                    return true;
                }
                sig.is_demo() != map.contains(marker)
            }
            StructuralException::VariantBySiblingCount {
                game_id,
                pattern,
                first,
                last,
                threshold,
                at_least,
                below,
                ..
            } => {
                if !sig.game_id.eq_ignore_ascii_case(game_id) {
                    return true;
                }
                let Some(variant) = sig.variant_tag.as_deref() else {
                    return true;
                };
                let count = (*first..=*last)
                    .filter(|&n| map.contains(&substitute_index(pattern, n)))
                    .count();
                let (keep, drop) = if count >= *threshold {
                    (at_least, below)
                } else {
                    (below, at_least)
                };
                keep.iter().any(|v| v == variant) || !drop.iter().any(|v| v == variant)
            }
        }
    }
}

/// The declarative battery, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicRules {
    pub version_gates: Vec<VersionGate>,
    pub header_rules: Vec<HeaderRule>,
    pub sibling_rules: Vec<SiblingRule>,
    pub exceptions: Vec<StructuralException>,
}

impl HeuristicRules {
    fn gate_for(&self, family: &str) -> Option<&VersionGate> {
        self.version_gates
            .iter()
            .find(|g| g.families.iter().any(|f| f.eq_ignore_ascii_case(family)))
            .or_else(|| self.version_gates.iter().find(|g| g.families.is_empty()))
    }
}

/// Output of one family.
#[derive(Debug, Default)]
pub struct Disambiguation {
    pub results: Vec<MatchResult>,
    pub issue: Option<DetectionIssue>,
}

pub struct HeuristicDisambiguator<'a> {
    rules: &'a HeuristicRules,
}

impl<'a> HeuristicDisambiguator<'a> {
    pub fn new(rules: &'a HeuristicRules) -> Self {
        Self { rules }
    }

    /// Groups deferred candidates by family and detection file, keeping
    /// first-seen order.
    pub fn group(deferred: Vec<DeferredCandidate>) -> Vec<(String, Vec<DeferredCandidate>)> {
        let mut positions: HashMap<(String, PathBuf), usize> = HashMap::new();
        let mut families: Vec<(String, Vec<DeferredCandidate>)> = Vec::new();
        for candidate in deferred {
            let key = (candidate.family.clone(), candidate.primary.path().to_path_buf());
            match positions.get(&key) {
                Some(&at) => families[at].1.push(candidate),
                None => {
                    positions.insert(key, families.len());
                    families.push((candidate.family.clone(), vec![candidate]));
                }
            }
        }
        families
    }

    pub fn disambiguate(
        &self,
        family: &str,
        mut candidates: Vec<DeferredCandidate>,
        map: &NameMap,
    ) -> Disambiguation {
        let initial = candidates.len();

        if let Some(gate) = self.rules.gate_for(family) {
            candidates.retain(|c| gate.admits(&c.signature));
            trace!(family, left = candidates.len(), "version gate");
        }

        let header_rules: Vec<&HeaderRule> = self
            .rules
            .header_rules
            .iter()
            .filter(|r| r.family.eq_ignore_ascii_case(family))
            .collect();
        if !header_rules.is_empty() && !candidates.is_empty() {
            if let Some(header) = candidates[0].header_bytes() {
                if let Some(rule) = header_rules.iter().find(|r| r.matches(&header)) {
                    candidates.retain(|c| rule.admit.admits(&c.signature));
                    trace!(family, magic = %hex::encode(&rule.magic), left = candidates.len(), "header rule");
                }
            }
        }

        // Packed data has no loose siblings to inspect.
        let loose = candidates
            .first()
            .map_or(true, |c| c.primary_probe.packed.is_none());

        if loose {
            for rule in self
                .rules
                .sibling_rules
                .iter()
                .filter(|r| r.family.eq_ignore_ascii_case(family))
            {
                candidates.retain(|c| !rule.excludes(&c.signature, map));
            }

            for exception in self
                .rules
                .exceptions
                .iter()
                .filter(|e| e.family().eq_ignore_ascii_case(family))
            {
                candidates.retain(|c| exception.keeps(&c.signature, map));
            }
        }

        debug!(family, initial, survivors = candidates.len(), "disambiguated family");

        let issue = (candidates.len() > 1).then(|| {
            let names: Vec<String> = candidates
                .iter()
                .map(|c| match &c.signature.variant_tag {
                    Some(v) => format!("{} ({})", c.signature.game_id, v),
                    None => c.signature.game_id.clone(),
                })
                .collect();
            DetectionIssue::new(
                DetectionIssueKind::AmbiguousMatch,
                format!("{} candidates remain: {}", candidates.len(), names.join(", ")),
            )
            .with_file(family.to_string())
        });

        Disambiguation {
            results: candidates
                .into_iter()
                .map(|c| c.into_result(Confidence::Heuristic))
                .collect(),
            issue,
        }
    }
}
