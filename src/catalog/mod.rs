//! The signature database: every catalogued release plus the side tables
//! the detection pipeline consults.
//!
//! A database is an immutable value. [`SignatureDatabase::builtin`] assembles
//! the compiled-in catalogue; [`SignatureDatabase::from_json_str`] loads an
//! external one with the same layout. Both are validated once on
//! construction and never change afterwards.

mod agos;
mod rules;
mod scumm;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{
    CandidateSignature, ContainerHint, FingerprintCap, GenerationRule, Platform, ResolvedTarget,
};
use crate::detection::containers::D64_MAX_IMAGE_SIZE;
use crate::detection::heuristics::{HeuristicRules, StructuralException};
use crate::detection::index::FingerprintIndex;
use crate::detection::naming::{ObsoleteId, TitleEntry};
use crate::detection::patterns::{find_slot, PackedExecutable, MAX_SLOT_WIDTH};
use crate::detection::reduce::DenylistEntry;
use crate::error::{ResolverError, Result};

/// Bytes read past the largest fingerprint cap, so container headers and
/// trailing resource data still fit in the shared prefix.
const READ_SLACK: u64 = 4096;
/// Header magic must sit inside this many leading bytes.
const MAX_HEADER_END: usize = 64 * 1024;

/// Serialized form of a database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub signatures: Vec<CandidateSignature>,
    pub titles: Vec<TitleEntry>,
    pub obsolete_ids: Vec<ObsoleteId>,
    pub packed_executables: Vec<PackedExecutable>,
    pub heuristics: HeuristicRules,
    pub denylist: Vec<DenylistEntry>,
}

#[derive(Debug, Clone)]
pub struct SignatureDatabase {
    signatures: Vec<Arc<CandidateSignature>>,
    titles: Vec<TitleEntry>,
    obsolete_ids: Vec<ObsoleteId>,
    packed_executables: Vec<PackedExecutable>,
    heuristics: HeuristicRules,
    denylist: Vec<DenylistEntry>,
    index: FingerprintIndex,
    read_span: u64,
}

impl SignatureDatabase {
    /// The compiled-in catalogue. Fingerprinted releases come first so they
    /// are tried before the pattern-only families.
    pub fn builtin() -> Self {
        let mut signatures = agos::signatures();
        signatures.extend(scumm::signatures());
        let mut titles = agos::titles();
        titles.extend(scumm::titles());
        Self::assemble(CatalogData {
            signatures,
            titles,
            obsolete_ids: scumm::obsolete_ids(),
            packed_executables: scumm::packed_executables(),
            heuristics: rules::heuristics(),
            denylist: Vec::new(),
        })
    }

    /// Validates `data` and builds the lookup structures.
    pub fn from_catalog(data: CatalogData) -> Result<Self> {
        validate(&data)?;
        Ok(Self::assemble(data))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let data: CatalogData =
            serde_json::from_str(s).map_err(|e| ResolverError::Serialization(e.to_string()))?;
        Self::from_catalog(data)
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn assemble(data: CatalogData) -> Self {
        let index = FingerprintIndex::build(data.signatures.iter());
        let read_span = read_span_for(&data);
        let signatures: Vec<Arc<CandidateSignature>> =
            data.signatures.into_iter().map(Arc::new).collect();
        info!(
            signatures = signatures.len(),
            fingerprints = index.len(),
            read_span,
            "signature database ready"
        );
        Self {
            signatures,
            titles: data.titles,
            obsolete_ids: data.obsolete_ids,
            packed_executables: data.packed_executables,
            heuristics: data.heuristics,
            denylist: data.denylist,
            index,
            read_span,
        }
    }

    pub fn to_catalog(&self) -> CatalogData {
        CatalogData {
            signatures: self.signatures.iter().map(|s| s.as_ref().clone()).collect(),
            titles: self.titles.clone(),
            obsolete_ids: self.obsolete_ids.clone(),
            packed_executables: self.packed_executables.clone(),
            heuristics: self.heuristics.clone(),
            denylist: self.denylist.clone(),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_catalog())
            .map_err(|e| ResolverError::Serialization(e.to_string()))
    }

    /// Re-runs load-time validation.
    pub fn validate(&self) -> Result<()> {
        validate(&self.to_catalog())
    }

    pub fn signatures(&self) -> &[Arc<CandidateSignature>] {
        &self.signatures
    }

    pub fn index(&self) -> &FingerprintIndex {
        &self.index
    }

    pub fn packed_executables(&self) -> &[PackedExecutable] {
        &self.packed_executables
    }

    pub fn heuristics(&self) -> &HeuristicRules {
        &self.heuristics
    }

    pub fn denylist(&self) -> &[DenylistEntry] {
        &self.denylist
    }

    pub fn titles(&self) -> &[TitleEntry] {
        &self.titles
    }

    /// How many leading bytes of a file any test can look at.
    pub fn read_span(&self) -> u64 {
        self.read_span
    }

    /// Title entry for `game_id`, following retired ids.
    pub fn find_title(&self, game_id: &str) -> Option<&TitleEntry> {
        let direct = |id: &str| self.titles.iter().find(|t| t.game_id.eq_ignore_ascii_case(id));
        direct(game_id).or_else(|| {
            self.obsolete_ids
                .iter()
                .find(|o| o.from.eq_ignore_ascii_case(game_id))
                .and_then(|o| direct(&o.to))
        })
    }

    /// Rewrites a target saved under a retired game id. Returns whether it
    /// changed.
    pub fn upgrade_target(&self, target: &mut ResolvedTarget) -> bool {
        let upgraded = self.obsolete_ids.iter().any(|o| o.upgrade(target));
        if upgraded {
            debug!(game = %target.game_id, "upgraded retired game id");
        }
        upgraded
    }
}

fn read_span_for(data: &CatalogData) -> u64 {
    let caps = data
        .signatures
        .iter()
        .flat_map(|s| s.required_files.iter())
        .map(|r| r.cap.bytes().saturating_add(READ_SLACK));
    let disk_images = data
        .signatures
        .iter()
        .flat_map(|s| s.required_files.iter())
        .filter(|r| matches!(r.container, ContainerHint::DiskImage { .. }))
        .map(|_| D64_MAX_IMAGE_SIZE);
    let packed = data
        .packed_executables
        .iter()
        .map(|p| p.offset.saturating_add(p.length));
    let headers = data
        .heuristics
        .header_rules
        .iter()
        .map(|h| h.offset.saturating_add(h.magic.len()) as u64);
    caps.chain(disk_images)
        .chain(packed)
        .chain(headers)
        .fold(READ_SLACK, u64::max)
}

fn validate(data: &CatalogData) -> Result<()> {
    let packed_titles: HashSet<(String, Platform)> = data
        .packed_executables
        .iter()
        .map(|p| (p.title.to_ascii_lowercase(), p.platform))
        .collect();

    for sig in &data.signatures {
        if sig.game_id.trim().is_empty() {
            return Err(ResolverError::invalid_signature(&sig.game_id, "empty game id"));
        }
        if sig.required_files.is_empty() {
            return Err(ResolverError::invalid_signature(&sig.game_id, "no required files"));
        }
        for req in &sig.required_files {
            if req.name.is_empty() {
                return Err(ResolverError::invalid_signature(&sig.game_id, "empty file name"));
            }
            if req.cap == FingerprintCap::new(0) {
                return Err(ResolverError::invalid_signature(
                    &sig.game_id,
                    format!("'{}' has a zero fingerprint cap", req.name),
                ));
            }
            match &req.rule {
                GenerationRule::DiskNumber | GenerationRule::RoomNumber => {
                    check_slot(&sig.game_id, &req.name)?;
                }
                GenerationRule::PackedExecutable { title }
                    if !packed_titles.contains(&(title.to_ascii_lowercase(), sig.platform)) =>
                {
                    return Err(ResolverError::invalid_signature(
                        &sig.game_id,
                        format!("no packed executable registered for '{}' on {}", title, sig.platform),
                    ));
                }
                _ => {}
            }
            if let ContainerHint::DiskImage { inner_name, .. } = &req.container {
                if inner_name.is_empty() {
                    return Err(ResolverError::invalid_signature(
                        &sig.game_id,
                        format!("'{}' names no file inside the image", req.name),
                    ));
                }
            }
        }
    }

    for packed in &data.packed_executables {
        if packed.length == 0 || packed.executable.is_empty() {
            return Err(ResolverError::invalid_signature(
                &packed.title,
                format!("packed slice in '{}' is empty", packed.executable),
            ));
        }
    }

    for rule in &data.heuristics.header_rules {
        if rule.magic.is_empty() {
            return Err(ResolverError::invalid_signature(
                &rule.family,
                "header rule with empty magic",
            ));
        }
        if rule
            .offset
            .checked_add(rule.magic.len())
            .map_or(true, |end| end > MAX_HEADER_END)
        {
            return Err(ResolverError::invalid_signature(
                &rule.family,
                format!(
                    "header magic at offset {} lies beyond the first {} bytes",
                    rule.offset, MAX_HEADER_END
                ),
            ));
        }
    }

    for exception in &data.heuristics.exceptions {
        if let StructuralException::VariantBySiblingCount { game_id, pattern, .. } = exception {
            check_slot(game_id, pattern)?;
        }
    }

    for entry in &data.denylist {
        if entry.note.trim().is_empty() {
            return Err(ResolverError::invalid_signature(
                entry.game_id.as_deref().unwrap_or("*"),
                format!("denylist entry {} has no note", entry.fingerprint),
            ));
        }
    }
    Ok(())
}

fn check_slot(game_id: &str, pattern: &str) -> Result<()> {
    match find_slot(pattern) {
        None => Err(ResolverError::invalid_signature(
            game_id,
            format!("'{}' has no number slot", pattern),
        )),
        Some(slot) if slot.width.map_or(true, |w| w > MAX_SLOT_WIDTH) => {
            Err(ResolverError::invalid_signature(
                game_id,
                format!("'{}' asks for a number wider than {} digits", pattern, MAX_SLOT_WIDTH),
            ))
        }
        Some(_) => Ok(()),
    }
}
