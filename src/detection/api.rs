//! Scan entry points.
//!
//! A [`Resolver`] pairs a signature database with a run configuration and
//! drives the whole pipeline: collect, probe, disambiguate, reduce. Every
//! scan starts from fresh per-scan state; the database is only read.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};

use super::collector::FileCollector;
use super::config::ResolverConfig;
use super::evidence::{FileEvidence, NameMap};
use super::fs::{DiskNode, FsNode};
use super::heuristics::HeuristicDisambiguator;
use super::matcher::{CandidateMatcher, MatchContext};
use super::naming::TargetNamer;
use super::patterns::PatternGenerator;
use super::reduce::ResultReducer;
use crate::catalog::SignatureDatabase;
use crate::core::{
    Confidence, DetectionIssue, DetectionIssueKind, MatchResult, ResolvedTarget,
    UnknownFingerprintReport,
};
use crate::error::{ResolverError, Result};

/// Counters describing one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_collected: usize,
    pub signatures_considered: usize,
    /// Signatures dropped because a required file was absent.
    pub missing_evidence: usize,
    pub exact_matches: usize,
    pub heuristic_matches: usize,
}

/// Everything a scan found, best match first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub matches: Vec<MatchResult>,
    pub issues: Vec<DetectionIssue>,
    pub unknown_fingerprints: Vec<UnknownFingerprintReport>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// More than one heuristic candidate survived somewhere.
    pub fn is_ambiguous(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.kind == DetectionIssueKind::AmbiguousMatch)
    }

    pub fn best(&self) -> Option<&MatchResult> {
        self.matches.iter().find(|m| !m.corrupted)
    }

    /// The target to persist for the best usable match, named with `db`'s
    /// title table. Corrupted releases are never picked.
    pub fn resolve(&self, db: &SignatureDatabase) -> Option<ResolvedTarget> {
        let best = self.best()?;
        let mut target = ResolvedTarget::from_match(best);
        target.target = Some(TargetNamer::new(db.titles()).name(best));
        Some(target)
    }

    pub fn issues_of(&self, kind: DetectionIssueKind) -> impl Iterator<Item = &DetectionIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ResolverError::Serialization(e.to_string()))
    }
}

pub struct Resolver<'db> {
    db: &'db SignatureDatabase,
    config: ResolverConfig,
    collector: FileCollector,
}

impl<'db> Resolver<'db> {
    /// Fails only when a directory glob in `config` does not compile.
    pub fn new(db: &'db SignatureDatabase, config: ResolverConfig) -> Result<Self> {
        let collector = FileCollector::new(&config.collector, db.read_span())?;
        Ok(Self { db, config, collector })
    }

    pub fn with_defaults(db: &'db SignatureDatabase) -> Result<Self> {
        Self::new(db, ResolverConfig::default())
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Scans `root`. Unreadable entries become issues; this never fails.
    pub fn scan(&self, root: &dyn FsNode) -> ScanReport {
        // Without a cancel flag the only error path is unreachable.
        self.run(root, None, None).unwrap_or_default()
    }

    pub fn scan_path(&self, path: impl AsRef<Path>) -> Result<ScanReport> {
        let path = path.as_ref();
        let root = DiskNode::open(path)?;
        if !root.is_directory() {
            return Err(ResolverError::InvalidInput(format!(
                "'{}' is not a directory",
                path.display()
            )));
        }
        self.run(&root, None, None)
    }

    /// Like [`Resolver::scan`], checking `cancel` between signatures.
    pub fn scan_with_cancel(&self, root: &dyn FsNode, cancel: &AtomicBool) -> Result<ScanReport> {
        self.run(root, None, Some(cancel))
    }

    /// Only considers signatures of `game_id`.
    pub fn scan_for_game(&self, root: &dyn FsNode, game_id: &str) -> ScanReport {
        self.run(root, Some(game_id), None).unwrap_or_default()
    }

    fn run(
        &self,
        root: &dyn FsNode,
        only_game: Option<&str>,
        cancel: Option<&AtomicBool>,
    ) -> Result<ScanReport> {
        info!(root = %root.path().display(), game = ?only_game, "scanning");
        let map = self
            .collector
            .collect(root, self.config.collector.max_depth);

        if self.config.fingerprint.parallel_prefetch {
            self.prefetch(&map, only_game);
        }

        let ctx = MatchContext {
            signatures: self.db.signatures(),
            index: self.db.index(),
            packed: self.db.packed_executables(),
            only_game,
            report_unknown: self.config.fingerprint.report_unknown,
            cancel,
        };
        let outcome = CandidateMatcher::new(ctx).match_all(&map)?;

        let mut matches = outcome.exact;
        let mut issues = outcome.issues;

        if self.config.matching.allow_heuristic {
            let disambiguator = HeuristicDisambiguator::new(self.db.heuristics());
            for (family, members) in HeuristicDisambiguator::group(outcome.deferred) {
                let result = disambiguator.disambiguate(&family, members, &map);
                matches.extend(result.results);
                issues.extend(result.issue);
            }
        } else if !outcome.deferred.is_empty() {
            debug!(
                deferred = outcome.deferred.len(),
                "heuristic matching disabled, dropping deferred candidates"
            );
        }

        let overrides = &self.config.overrides;
        let (matches, reduce_issues) = ResultReducer::new(self.db.denylist()).reduce(
            matches,
            overrides.language,
            overrides.platform,
        );
        issues.extend(reduce_issues);

        let stats = ScanStats {
            files_collected: map.len(),
            signatures_considered: outcome.signatures_considered,
            missing_evidence: outcome.missing_evidence,
            exact_matches: matches.iter().filter(|m| m.is_exact()).count(),
            heuristic_matches: matches
                .iter()
                .filter(|m| m.confidence == Confidence::Heuristic)
                .count(),
        };
        info!(
            files = stats.files_collected,
            exact = stats.exact_matches,
            heuristic = stats.heuristic_matches,
            issues = issues.len(),
            "scan finished"
        );

        Ok(ScanReport {
            matches,
            issues,
            unknown_fingerprints: outcome.unknown,
            stats,
        })
    }

    /// Loads the prefix of every file some signature would probe, in parallel.
    fn prefetch(&self, map: &NameMap, only_game: Option<&str>) {
        let generator = PatternGenerator::new(self.db.packed_executables());
        let mut names: BTreeSet<String> = BTreeSet::new();
        for sig in self.db.signatures() {
            if only_game.is_some_and(|g| !sig.game_id.eq_ignore_ascii_case(g)) {
                continue;
            }
            for req in &sig.required_files {
                for probe in generator.generate(&req.rule, &req.name, sig.platform) {
                    names.insert(probe.name.to_lowercase());
                }
            }
        }
        let files: Vec<Arc<FileEvidence>> = names
            .iter()
            .filter_map(|n| map.get(n).cloned())
            .collect();
        debug!(files = files.len(), "prefetching candidate files");
        files.par_iter().for_each(|evidence| {
            let _ = evidence.prefix();
        });
    }
}
