//! Per-signature probing: pattern, file lookup, fingerprint, classification.
//!
//! Signatures are visited in declaration order. Each one either fails fast
//! on a missing file, matches exactly, is eliminated by a fingerprint that
//! belongs to another release, or is deferred to the heuristic battery.
//! File content is read through [`FileEvidence`], so a path is loaded at most
//! once however many signatures reference it.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::containers::{companion_name, ContainerTransform, ContainerUnwrapper};
use super::evidence::{ContentView, FileEvidence, NameMap, UnwrappedContent};
use super::index::{CandidateRecord, FingerprintIndex};
use super::patterns::{PackedExecutable, PatternGenerator, Probe};
use crate::core::{
    CandidateSignature, Confidence, ContainerHint, ContainerKind, DetectionIssue,
    DetectionIssueKind, Fingerprint, FileRequirement, MatchResult, MatchedFile, Platform,
    UnknownFingerprintReport,
};
use crate::error::{ResolverError, Result};

/// Read-only inputs shared by every probe of one pass.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub signatures: &'a [Arc<CandidateSignature>],
    pub index: &'a FingerprintIndex,
    pub packed: &'a [PackedExecutable],
    /// Restrict the pass to one game id (case-insensitive).
    pub only_game: Option<&'a str>,
    pub report_unknown: bool,
    pub cancel: Option<&'a AtomicBool>,
}

/// A signature whose files are present but which no fingerprint settled.
#[derive(Debug, Clone)]
pub struct DeferredCandidate {
    pub signature_index: usize,
    pub signature: Arc<CandidateSignature>,
    /// Case-folded logical name of the detection file; signatures sharing it
    /// form one heuristic family.
    pub family: String,
    pub primary: Arc<FileEvidence>,
    pub primary_probe: Probe,
    pub primary_container: ContainerHint,
    pub evidence: Vec<MatchedFile>,
}

impl DeferredCandidate {
    /// Leading bytes of the detection file as the engine would see them.
    pub fn header_bytes(&self) -> Option<Arc<[u8]>> {
        if let Some(packed) = &self.primary_probe.packed {
            let raw = self.primary.prefix().ok()?;
            let transform = ContainerTransform::PackedSlice {
                index_file: packed.index_file.clone(),
                offset: packed.offset,
                length: packed.length,
            };
            return transform
                .unwrap(&raw, self.primary.raw_size())
                .map(|c| c.data);
        }
        if let Some(content) = self.primary.unwrapped() {
            return Some(Arc::clone(&content.data));
        }
        let raw = self.primary.prefix().ok()?;
        match &self.primary_container {
            ContainerHint::Auto => Some(raw),
            hint => ContainerUnwrapper::try_unwrap(&self.primary, hint)
                .map(|c| c.data)
                .or(Some(raw)),
        }
    }

    pub fn into_result(self, confidence: Confidence) -> MatchResult {
        MatchResult {
            resolved_language: self.signature.language,
            resolved_platform: self.signature.platform,
            signature: self.signature,
            signature_index: self.signature_index,
            confidence,
            evidence: self.evidence,
            corrupted: false,
            corruption_note: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub exact: Vec<MatchResult>,
    pub deferred: Vec<DeferredCandidate>,
    pub issues: Vec<DetectionIssue>,
    pub unknown: Vec<UnknownFingerprintReport>,
    pub signatures_considered: usize,
    pub missing_evidence: usize,
}

impl MatchOutcome {
    /// Drops deferred candidates whose detection file already backs an exact
    /// match.
    pub fn retire_consumed_families(&mut self) {
        let consumed: BTreeSet<PathBuf> = self
            .exact
            .iter()
            .flat_map(|m| m.evidence.iter().map(|f| f.path.clone()))
            .collect();
        let before = self.deferred.len();
        self.deferred
            .retain(|d| !consumed.contains(d.primary.path()));
        if before != self.deferred.len() {
            debug!(
                dropped = before - self.deferred.len(),
                "deferred candidates superseded by exact matches"
            );
        }
    }
}

struct Located {
    requirement_index: usize,
    probe: Probe,
    evidence: Arc<FileEvidence>,
}

/// The content a requirement is judged on.
struct Effective {
    view: ContentView,
    data: Arc<[u8]>,
    size: u64,
    container: Option<ContainerKind>,
}

enum Verdict {
    Matched(MatchedFile),
    /// Wrong content, and the content belongs to a catalogued release
    /// (`None` when only the expected size disagreed).
    Known(Option<CandidateRecord>),
    /// Wrong content that nothing in the catalogue knows about.
    Unknown(MatchedFile, UnknownFingerprintReport),
    /// The file is too short or unreadable.
    Unusable(Option<String>),
}

pub struct CandidateMatcher<'a> {
    ctx: MatchContext<'a>,
    generator: PatternGenerator<'a>,
}

impl<'a> CandidateMatcher<'a> {
    pub fn new(ctx: MatchContext<'a>) -> Self {
        Self {
            generator: PatternGenerator::new(ctx.packed),
            ctx,
        }
    }

    /// Probes every signature against `map`.
    pub fn match_all(&self, map: &NameMap) -> Result<MatchOutcome> {
        let mut out = MatchOutcome::default();
        let mut reported: HashSet<(PathBuf, Fingerprint)> = HashSet::new();
        let mut failed_paths: HashSet<PathBuf> = HashSet::new();

        for (signature_index, signature) in self.ctx.signatures.iter().enumerate() {
            if let Some(flag) = self.ctx.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(ResolverError::Cancelled);
                }
            }
            if let Some(game) = self.ctx.only_game {
                if !signature.game_id.eq_ignore_ascii_case(game) {
                    continue;
                }
            }
            out.signatures_considered += 1;

            let Some(located) = self.locate(signature, map) else {
                out.missing_evidence += 1;
                continue;
            };

            let mut evidence = Vec::with_capacity(located.len());
            let mut pending_unknown = Vec::new();
            let mut eliminated = false;
            for item in &located {
                let requirement = &signature.required_files[item.requirement_index];
                match self.judge(signature, requirement, item) {
                    Verdict::Matched(file) => evidence.push(file),
                    Verdict::Unknown(file, report) => {
                        evidence.push(file);
                        pending_unknown.push(report);
                    }
                    Verdict::Known(owner) => {
                        match owner {
                            Some(record) => trace!(
                                game = %signature.game_id,
                                file = %item.evidence.display_name(),
                                owner = %record.game_id,
                                owner_variant = ?self.variant_of(record.signature_index),
                                owner_platform = %record.platform,
                                owner_language = %record.language,
                                "content belongs to another release"
                            ),
                            None => trace!(
                                game = %signature.game_id,
                                file = %item.evidence.display_name(),
                                "content size does not fit"
                            ),
                        }
                        eliminated = true;
                        break;
                    }
                    Verdict::Unusable(error) => {
                        if let Some(error) = error {
                            let path = item.evidence.path().to_path_buf();
                            if failed_paths.insert(path) {
                                out.issues.push(
                                    DetectionIssue::new(DetectionIssueKind::IoFailure, error)
                                        .with_game(signature.game_id.clone())
                                        .with_file(item.evidence.display_name()),
                                );
                            }
                        }
                        eliminated = true;
                        break;
                    }
                }
            }
            if eliminated {
                continue;
            }

            for report in pending_unknown {
                if !self.ctx.report_unknown {
                    break;
                }
                if reported.insert((report.path.clone(), report.fingerprint)) {
                    warn!(
                        file = %report.file_name,
                        size = report.size,
                        fingerprint = %report.fingerprint,
                        "unknown fingerprint, please report the details (language, platform, etc.) of this release"
                    );
                    out.issues.push(
                        DetectionIssue::new(DetectionIssueKind::UnknownFingerprint, report.to_string())
                            .with_file(report.file_name.clone()),
                    );
                    out.unknown.push(report);
                }
            }

            let all_fingerprints_hit = signature.has_fingerprints()
                && signature
                    .required_files
                    .iter()
                    .zip(evidence.iter())
                    .filter(|(req, _)| req.is_fingerprinted())
                    .all(|(req, file)| file.fingerprint == req.fingerprint);

            if all_fingerprints_hit {
                debug!(game = %signature.game_id, variant = ?signature.variant_tag, "exact match");
                out.exact.push(MatchResult {
                    signature: Arc::clone(signature),
                    signature_index,
                    confidence: Confidence::Exact,
                    resolved_language: signature.language,
                    resolved_platform: signature.platform,
                    evidence,
                    corrupted: false,
                    corruption_note: None,
                });
                continue;
            }

            let primary_index = signature.primary_index();
            let Some(primary) = located
                .iter()
                .find(|l| l.requirement_index == primary_index)
            else {
                continue;
            };
            trace!(game = %signature.game_id, family = %primary.probe.logical_name(), "deferred");
            out.deferred.push(DeferredCandidate {
                signature_index,
                signature: Arc::clone(signature),
                family: primary.probe.logical_name().to_lowercase(),
                primary: Arc::clone(&primary.evidence),
                primary_probe: primary.probe.clone(),
                primary_container: signature.required_files[primary_index].container.clone(),
                evidence,
            });
        }
        out.retire_consumed_families();
        Ok(out)
    }

    /// Finds a file for every requirement, or `None` when one is missing.
    fn locate(&self, signature: &CandidateSignature, map: &NameMap) -> Option<Vec<Located>> {
        let mut located = Vec::with_capacity(signature.required_files.len());
        for (requirement_index, requirement) in signature.required_files.iter().enumerate() {
            let probes =
                self.generator
                    .generate(&requirement.rule, &requirement.name, signature.platform);
            let Some((probe, evidence)) = probes
                .into_iter()
                .find_map(|p| map.get(&p.name).cloned().map(|e| (p, e)))
            else {
                trace!(game = %signature.game_id, requirement = %requirement.name, "missing evidence");
                return None;
            };
            if let ContainerHint::DiskImage { needs_companion: true, .. } = &requirement.container {
                let companion = companion_name(evidence.display_name());
                if !companion.is_some_and(|name| map.contains(&name)) {
                    trace!(game = %signature.game_id, image = %evidence.display_name(), "missing companion image");
                    return None;
                }
            }
            located.push(Located {
                requirement_index,
                probe,
                evidence,
            });
        }
        Some(located)
    }

    fn effective(&self, item: &Located) -> std::result::Result<Option<Effective>, String> {
        let ev = &item.evidence;
        if let Some(packed) = &item.probe.packed {
            let raw = ev.prefix()?;
            let transform = ContainerTransform::PackedSlice {
                index_file: packed.index_file.clone(),
                offset: packed.offset,
                length: packed.length,
            };
            return Ok(transform.unwrap(&raw, ev.raw_size()).map(|c| Effective {
                view: c.view(),
                size: c.logical_size,
                container: Some(c.kind),
                data: c.data,
            }));
        }
        if let Some(content) = ev.unwrapped() {
            return Ok(Some(Effective {
                view: content.view(),
                data: Arc::clone(&content.data),
                size: content.logical_size,
                container: Some(content.kind),
            }));
        }
        let raw = ev.prefix()?;
        Ok(Some(Effective {
            view: ContentView::Raw,
            data: raw,
            size: ev.raw_size(),
            container: None,
        }))
    }

    fn judge(
        &self,
        signature: &CandidateSignature,
        requirement: &FileRequirement,
        item: &Located,
    ) -> Verdict {
        let ev = &item.evidence;
        let matched_file = |fingerprint: Option<Fingerprint>, size: u64, container: Option<ContainerKind>| MatchedFile {
            requirement: requirement.name.clone(),
            file_name: ev.display_name().to_string(),
            path: ev.path().to_path_buf(),
            size,
            fingerprint,
            container,
        };

        // Presence-only requirements only read the detection file, whose
        // header the heuristic battery inspects.
        if !requirement.is_fingerprinted() && requirement.size.is_none() {
            if item.requirement_index == signature.primary_index() {
                if let Err(error) = ev.prefix() {
                    return Verdict::Unusable(Some(error));
                }
            }
            return Verdict::Matched(matched_file(None, ev.size(), None));
        }

        let effective = match self.effective(item) {
            Ok(Some(e)) => e,
            Ok(None) => return Verdict::Unusable(None),
            Err(error) => return Verdict::Unusable(Some(error)),
        };
        let size_ok = |size: u64| requirement.size.map_or(true, |expected| expected == size);
        let fp = requirement
            .fingerprint
            .map(|_| ev.fingerprint_with(effective.view.clone(), requirement.cap, &effective.data));

        if fp == requirement.fingerprint && size_ok(effective.size) {
            return Verdict::Matched(matched_file(fp, effective.size, effective.container));
        }

        // Retry through a wrapper, unless the content already is one.
        let mut unwrapped_fp = None;
        if effective.container.is_none() {
            if let Some(content) = self.unwrap_for(signature, requirement, ev) {
                let ufp = requirement
                    .fingerprint
                    .map(|_| ev.fingerprint_with(content.view(), requirement.cap, &content.data));
                if ufp == requirement.fingerprint && size_ok(content.logical_size) {
                    let (size, kind) = (content.logical_size, content.kind);
                    ev.accept_unwrapped(content);
                    return Verdict::Matched(matched_file(ufp, size, Some(kind)));
                }
                unwrapped_fp = ufp.map(|f| (f, content.logical_size, content.kind));
            }
        }

        let Some(raw_fp) = fp else {
            // Size-only requirement that did not fit.
            return Verdict::Known(None);
        };
        let owner = self
            .ctx
            .index
            .lookup(&raw_fp)
            .or_else(|| unwrapped_fp.and_then(|(f, _, _)| self.ctx.index.lookup(&f)));
        if let Some(record) = owner {
            return Verdict::Known(Some(record.clone()));
        }
        let (report_fp, report_size, container) = match unwrapped_fp {
            Some((f, size, kind)) => (f, size, Some(kind)),
            None => (raw_fp, effective.size, effective.container),
        };
        Verdict::Unknown(
            matched_file(Some(report_fp), report_size, container),
            UnknownFingerprintReport {
                file_name: ev.display_name().to_string(),
                path: ev.path().to_path_buf(),
                size: report_size,
                cap: requirement.cap,
                fingerprint: report_fp,
            },
        )
    }

    fn variant_of(&self, signature_index: usize) -> Option<&str> {
        self.ctx
            .signatures
            .get(signature_index)
            .and_then(|s| s.variant_tag.as_deref())
    }

    /// Resource-fork wrappers only stand in for Macintosh releases.
    fn unwrap_for(
        &self,
        signature: &CandidateSignature,
        requirement: &FileRequirement,
        ev: &FileEvidence,
    ) -> Option<UnwrappedContent> {
        let content = ContainerUnwrapper::try_unwrap(ev, &requirement.container)?;
        let fork_wrapper = matches!(content.kind, ContainerKind::MacBinary | ContainerKind::AppleSingle);
        if fork_wrapper && signature.platform != Platform::Macintosh {
            return None;
        }
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FingerprintCap, GenerationRule, Language};
    use crate::detection::collector::FileCollector;
    use crate::detection::config::CollectorConfig;
    use crate::detection::fs::MemoryTree;

    fn fp_of(data: &[u8]) -> Fingerprint {
        Fingerprint::of_prefix(data, FingerprintCap::PREFIX_5000)
    }

    fn sig(game: &str, lang: Language, files: &[(&str, &[u8])]) -> Arc<CandidateSignature> {
        let mut s = CandidateSignature::new(game, game).with_language(lang);
        for (name, data) in files {
            s = s.with_file(
                FileRequirement::literal(*name)
                    .with_fingerprint(fp_of(data))
                    .with_cap(FingerprintCap::PREFIX_5000),
            );
        }
        Arc::new(s)
    }

    fn run(sigs: &[Arc<CandidateSignature>], tree: MemoryTree) -> MatchOutcome {
        let root = tree.build();
        let map = FileCollector::new(&CollectorConfig::default(), 1 << 20)
            .unwrap()
            .collect(&*root, 2);
        let index = FingerprintIndex::build(sigs.iter().map(|s| s.as_ref()));
        let ctx = MatchContext {
            signatures: sigs,
            index: &index,
            packed: &[],
            only_game: None,
            report_unknown: true,
            cancel: None,
        };
        CandidateMatcher::new(ctx).match_all(&map).unwrap()
    }

    #[test]
    fn exact_match_and_language_elimination() {
        let sigs = vec![
            sig("titlea", Language::EnAny, &[("GAME.DAT", b"english")]),
            sig("titlea", Language::DeDeu, &[("GAME.DAT", b"deutsch")]),
        ];
        let out = run(&sigs, MemoryTree::new().file("game.dat", b"deutsch".to_vec()));
        assert_eq!(out.exact.len(), 1);
        assert_eq!(out.exact[0].resolved_language, Language::DeDeu);
        assert!(out.deferred.is_empty());
        assert!(out.unknown.is_empty());
    }

    #[test]
    fn missing_file_eliminates_without_issue() {
        let sigs = vec![sig("titlea", Language::EnAny, &[("GAME.DAT", b"x"), ("VOICE.DAT", b"y")])];
        let out = run(&sigs, MemoryTree::new().file("GAME.DAT", b"x".to_vec()));
        assert!(out.exact.is_empty());
        assert_eq!(out.missing_evidence, 1);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn unknown_dump_is_deferred_and_reported_once() {
        let sigs = vec![
            sig("titlea", Language::EnAny, &[("GAME.DAT", b"english")]),
            sig("titlea", Language::FrFra, &[("GAME.DAT", b"francais")]),
        ];
        let out = run(&sigs, MemoryTree::new().file("GAME.DAT", b"new dump".to_vec()));
        assert!(out.exact.is_empty());
        assert_eq!(out.deferred.len(), 2);
        assert_eq!(out.deferred[0].family, "game.dat");
        assert_eq!(out.unknown.len(), 1);
        assert_eq!(out.unknown[0].fingerprint, fp_of(b"new dump"));
        assert_eq!(
            out.issues
                .iter()
                .filter(|i| i.kind == DetectionIssueKind::UnknownFingerprint)
                .count(),
            1
        );
    }

    #[test]
    fn unreadable_file_is_an_io_issue() {
        let sigs = vec![sig("titlea", Language::EnAny, &[("GAME.DAT", b"x")])];
        let out = run(&sigs, MemoryTree::new().unreadable("GAME.DAT"));
        assert!(out.exact.is_empty() && out.deferred.is_empty());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].kind, DetectionIssueKind::IoFailure);
    }

    #[test]
    fn foreign_content_names_its_owner() {
        let sigs = vec![
            sig("titlea", Language::EnAny, &[("GAME.DAT", b"english")]),
            sig("titleb", Language::DeDeu, &[("GAME.DAT", b"deutsch")]),
        ];
        let root = MemoryTree::new().file("GAME.DAT", b"deutsch".to_vec()).build();
        let map = FileCollector::new(&CollectorConfig::default(), 1 << 20)
            .unwrap()
            .collect(&*root, 2);
        let index = FingerprintIndex::build(sigs.iter().map(|s| s.as_ref()));
        let matcher = CandidateMatcher::new(MatchContext {
            signatures: &sigs,
            index: &index,
            packed: &[],
            only_game: None,
            report_unknown: true,
            cancel: None,
        });
        let located = matcher.locate(&sigs[0], &map).unwrap();
        let verdict = matcher.judge(&sigs[0], &sigs[0].required_files[0], &located[0]);
        let Verdict::Known(Some(owner)) = verdict else {
            panic!("expected the content to be attributed to another release");
        };
        assert_eq!(owner.game_id, "titleb");
        assert_eq!(owner.signature_index, 1);
        assert_eq!(owner.language, Language::DeDeu);
    }

    #[test]
    fn unreadable_detection_file_is_not_deferred() {
        let s = Arc::new(
            CandidateSignature::new("maniac", "Maniac Mansion")
                .with_file(FileRequirement::new("%02d.LFL", GenerationRule::RoomNumber))
                .with_file(FileRequirement::literal("58.LFL")),
        );
        let out = run(&[s], MemoryTree::new().unreadable("00.LFL").file("58.LFL", vec![0u8; 4]));
        assert!(out.deferred.is_empty());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].kind, DetectionIssueKind::IoFailure);
        assert_eq!(out.issues[0].file.as_deref(), Some("00.LFL"));
    }

    #[test]
    fn unreadable_sibling_is_only_checked_for_presence() {
        let s = Arc::new(
            CandidateSignature::new("maniac", "Maniac Mansion")
                .with_file(FileRequirement::new("%02d.LFL", GenerationRule::RoomNumber))
                .with_file(FileRequirement::literal("58.LFL")),
        );
        let out = run(&[s], MemoryTree::new().file("00.LFL", vec![0u8; 4]).unreadable("58.LFL"));
        assert_eq!(out.deferred.len(), 1);
        assert!(out.issues.is_empty());
    }

    #[test]
    fn pattern_only_signatures_are_deferred_by_family() {
        let s = Arc::new(
            CandidateSignature::new("monkey", "The Secret of Monkey Island")
                .with_file(FileRequirement::new("monkey.%03d", GenerationRule::DiskNumber)),
        );
        let out = run(&[s], MemoryTree::new().file("MONKEY.000", vec![0u8; 8]));
        assert_eq!(out.deferred.len(), 1);
        assert_eq!(out.deferred[0].family, "monkey.000");
        assert_eq!(out.deferred[0].header_bytes().unwrap().len(), 8);
    }

    #[test]
    fn exact_match_retires_family() {
        let exact = sig("titlea", Language::EnAny, &[("GAME.DAT", b"english")]);
        let pattern = Arc::new(
            CandidateSignature::new("titlea", "Title A").with_file(FileRequirement::literal("game.dat")),
        );
        let out = run(&[exact, pattern], MemoryTree::new().file("GAME.DAT", b"english".to_vec()));
        assert_eq!(out.exact.len(), 1);
        assert!(out.deferred.is_empty());
    }

    #[test]
    fn macbinary_wrapped_file_matches_mac_release() {
        let payload = b"mac index".to_vec();
        let mut wrapped = vec![0u8; 128];
        wrapped[1] = 4;
        wrapped[83..87].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        wrapped.extend_from_slice(&payload);
        wrapped.resize(256, 0);

        let mac = Arc::new(
            CandidateSignature::new("loom", "Loom")
                .with_platform(Platform::Macintosh)
                .with_file(
                    FileRequirement::new("Loom", GenerationRule::ResourceFork)
                        .with_fingerprint(fp_of(&payload))
                        .with_cap(FingerprintCap::PREFIX_5000)
                        .with_container(ContainerHint::ResourceFork),
                ),
        );
        let out = run(&[mac], MemoryTree::new().file("Loom.bin", wrapped));
        assert_eq!(out.exact.len(), 1);
        let file = &out.exact[0].evidence[0];
        assert_eq!(file.container, Some(ContainerKind::MacBinary));
        assert_eq!(file.size, payload.len() as u64);
    }

    #[test]
    fn cancellation_stops_the_pass() {
        let sigs = vec![sig("titlea", Language::EnAny, &[("GAME.DAT", b"x")])];
        let index = FingerprintIndex::build(sigs.iter().map(|s| s.as_ref()));
        let flag = AtomicBool::new(true);
        let ctx = MatchContext {
            signatures: &sigs,
            index: &index,
            packed: &[],
            only_game: None,
            report_unknown: true,
            cancel: Some(&flag),
        };
        let result = CandidateMatcher::new(ctx).match_all(&NameMap::new());
        assert!(matches!(result, Err(ResolverError::Cancelled)));
    }
}
