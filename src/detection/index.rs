//! Sorted fingerprint table with binary-search lookup.
//!
//! Built once from the signature list and never mutated. Entries with equal
//! fingerprints keep signature declaration order, so `lookup` returns the
//! first declared record.

use crate::core::{CandidateSignature, Fingerprint, Language, Platform};

/// Which signature requirement a fingerprint belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub signature_index: usize,
    pub game_id: String,
    pub platform: Platform,
    pub language: Language,
}

#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    entries: Vec<(Fingerprint, CandidateRecord)>,
}

impl FingerprintIndex {
    pub fn build<'a, I>(signatures: I) -> Self
    where
        I: IntoIterator<Item = &'a CandidateSignature>,
    {
        let mut entries = Vec::new();
        for (signature_index, sig) in signatures.into_iter().enumerate() {
            for req in &sig.required_files {
                if let Some(fp) = req.fingerprint {
                    entries.push((
                        fp,
                        CandidateRecord {
                            signature_index,
                            game_id: sig.game_id.clone(),
                            platform: sig.platform,
                            language: sig.language,
                        },
                    ));
                }
            }
        }
        // Stable sort keeps declaration order among duplicates.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First record carrying exactly `fingerprint`.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&CandidateRecord> {
        let start = self.entries.partition_point(|(fp, _)| fp < fingerprint);
        self.entries
            .get(start)
            .filter(|(fp, _)| fp == fingerprint)
            .map(|(_, r)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FileRequirement;

    fn fp(byte: u8) -> Fingerprint {
        Fingerprint::from_bytes([byte; 16])
    }

    fn sigs() -> Vec<CandidateSignature> {
        vec![
            CandidateSignature::new("simon1", "Simon the Sorcerer")
                .with_language(Language::EnAny)
                .with_file(FileRequirement::literal("gamepc").with_fingerprint(fp(9)))
                .with_file(FileRequirement::literal("icon.dat").with_fingerprint(fp(3))),
            CandidateSignature::new("simon1", "Simon the Sorcerer")
                .with_language(Language::CsCze)
                .with_file(FileRequirement::literal("gamepc").with_fingerprint(fp(5)))
                .with_file(FileRequirement::literal("icon.dat").with_fingerprint(fp(3))),
            CandidateSignature::new("maniac", "Maniac Mansion")
                .with_file(FileRequirement::literal("00.LFL")),
        ]
    }

    #[test]
    fn lookup_finds_exact_key() {
        let index = FingerprintIndex::build(&sigs());
        assert_eq!(index.len(), 4);
        let rec = index.lookup(&fp(5)).unwrap();
        assert_eq!(rec.signature_index, 1);
        assert_eq!(rec.language, Language::CsCze);
        assert!(index.lookup(&fp(4)).is_none());
        assert!(index.lookup(&fp(0xff)).is_none());
    }

    #[test]
    fn duplicates_keep_declaration_order() {
        let index = FingerprintIndex::build(&sigs());
        let first = index.lookup(&fp(3)).unwrap();
        assert_eq!(first.signature_index, 0);
        assert_eq!(first.language, Language::EnAny);
    }

    #[test]
    fn empty_index() {
        let index = FingerprintIndex::build(&Vec::<CandidateSignature>::new());
        assert!(index.is_empty());
        assert!(index.lookup(&fp(1)).is_none());
    }
}
