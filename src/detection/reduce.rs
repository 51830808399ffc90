//! Final reduction of the match list.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, warn};

use crate::core::{DetectionIssue, DetectionIssueKind, Fingerprint, Language, MatchResult, Platform};

/// A shipped release known to carry damaged data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenylistEntry {
    pub fingerprint: Fingerprint,
    /// Restricts the entry to one game id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub note: String,
}

impl DenylistEntry {
    fn applies(&self, result: &MatchResult) -> bool {
        self.game_id
            .as_deref()
            .map_or(true, |g| g.eq_ignore_ascii_case(result.game_id()))
            && result.fingerprints().any(|fp| *fp == self.fingerprint)
    }
}

/// Whether a result with `actual` passes a language filter of `wanted`.
/// Results of unknown language are never dropped by a filter.
pub fn language_compatible(wanted: Language, actual: Language) -> bool {
    wanted == actual
        || actual == Language::Unknown
        || (actual.is_english() && wanted.is_english()
            && (actual == Language::EnAny || wanted == Language::EnAny))
}

pub fn platform_compatible(wanted: Platform, actual: Platform) -> bool {
    wanted == actual || actual == Platform::Unknown
}

pub struct ResultReducer<'a> {
    denylist: &'a [DenylistEntry],
}

impl<'a> ResultReducer<'a> {
    pub fn new(denylist: &'a [DenylistEntry]) -> Self {
        Self { denylist }
    }

    /// Filter, prune subsets, flag corrupted releases and order the rest.
    pub fn reduce(
        &self,
        matches: Vec<MatchResult>,
        language: Option<Language>,
        platform: Option<Platform>,
    ) -> (Vec<MatchResult>, Vec<DetectionIssue>) {
        let mut issues = Vec::new();

        let mut kept: Vec<MatchResult> = matches
            .into_iter()
            .filter(|m| language.map_or(true, |l| language_compatible(l, m.resolved_language)))
            .filter(|m| platform.map_or(true, |p| platform_compatible(p, m.resolved_platform)))
            .collect();

        kept = prune_subsets(kept);

        for result in kept.iter_mut().filter(|m| m.is_exact()) {
            if let Some(entry) = self.denylist.iter().find(|e| e.applies(result)) {
                warn!(
                    game = %result.game_id(),
                    fingerprint = %entry.fingerprint,
                    "matched a release known to ship damaged data"
                );
                result.corrupted = true;
                result.corruption_note = Some(entry.note.clone());
                issues.push(
                    DetectionIssue::new(
                        DetectionIssueKind::KnownCorruptedMatch,
                        format!(
                            "{}. This copy is known to be damaged; replace the affected files from \
                             original media before playing.",
                            entry.note
                        ),
                    )
                    .with_game(result.game_id().to_string()),
                );
            }
        }

        kept.sort_by_key(|m| (m.confidence, Reverse(m.evidence_file_count()), m.signature_index));
        (kept, issues)
    }
}

/// Drops every match whose evidence paths are a strict subset of another
/// match for the same game id.
pub fn prune_subsets(matches: Vec<MatchResult>) -> Vec<MatchResult> {
    let paths: Vec<_> = matches.iter().map(|m| m.evidence_paths()).collect();
    let dominated: Vec<bool> = (0..matches.len())
        .map(|b| {
            (0..matches.len()).any(|a| {
                a != b
                    && matches[a].game_id().eq_ignore_ascii_case(matches[b].game_id())
                    && paths[a].len() > paths[b].len()
                    && paths[b].is_subset(&paths[a])
            })
        })
        .collect();
    let before = matches.len();
    let kept: Vec<MatchResult> = matches
        .into_iter()
        .zip(dominated)
        .filter_map(|(m, d)| (!d).then_some(m))
        .collect();
    if kept.len() != before {
        debug!(pruned = before - kept.len(), "pruned subset matches");
    }
    kept
}
