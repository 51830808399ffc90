use assetid::catalog::{CatalogData, SignatureDatabase};
use assetid::core::{
    CandidateSignature, Confidence, DetectionIssueKind, FileRequirement, Fingerprint,
    FingerprintCap, Language, Platform,
};
use assetid::detection::reduce::DenylistEntry;
use assetid::detection::{MemoryTree, Resolver, ResolverConfig};
use tempfile::TempDir;

use crate::common::{content, database, fp, release, write_files};

fn title_a_db() -> SignatureDatabase {
    database(vec![
        release("titlea", Language::EnAny, Platform::Dos, &[("GAME.DAT", b"title a, english floppy")]),
        release("titlea", Language::DeDeu, Platform::Dos, &[("GAME.DAT", b"title a, deutsch")]),
    ])
}

#[test]
fn extra_files_do_not_affect_an_exact_match() {
    let db = title_a_db();
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[("GAME.DAT", b"title a, english floppy"), ("README.TXT", b"read me")],
    );
    let report = Resolver::with_defaults(&db)
        .unwrap()
        .scan_path(dir.path())
        .unwrap();

    assert_eq!(report.matches.len(), 1);
    let m = &report.matches[0];
    assert_eq!(m.game_id(), "titlea");
    assert_eq!(m.resolved_language, Language::EnAny);
    assert_eq!(m.confidence, Confidence::Exact);
    assert_eq!(m.evidence.len(), 1);
    assert_eq!(m.evidence[0].file_name, "GAME.DAT");
    assert!(report.issues.is_empty());
    assert_eq!(report.stats.files_collected, 2);
    assert_eq!(report.stats.exact_matches, 1);
}

#[test]
fn file_name_case_does_not_matter() {
    let db = title_a_db();
    let resolver = Resolver::with_defaults(&db).unwrap();
    let lower = MemoryTree::new()
        .file("game.dat", b"title a, deutsch".to_vec())
        .build();
    let upper = MemoryTree::new()
        .file("GAME.DAT", b"title a, deutsch".to_vec())
        .build();
    let a = resolver.scan(&*lower);
    let b = resolver.scan(&*upper);
    assert_eq!(a.matches.len(), 1);
    assert_eq!(a.matches[0].signature_index, b.matches[0].signature_index);
    assert_eq!(a.matches[0].resolved_language, Language::DeDeu);
}

#[test]
fn empty_directory_is_not_an_error() {
    let db = title_a_db();
    let dir = TempDir::new().unwrap();
    let report = Resolver::with_defaults(&db)
        .unwrap()
        .scan_path(dir.path())
        .unwrap();
    assert!(report.matches.is_empty());
    assert!(report.issues.is_empty());
    assert!(report.resolve(&db).is_none());
}

#[test]
fn subset_release_is_pruned() {
    let files: Vec<(String, Vec<u8>)> = (0..5u8)
        .map(|i| (format!("DISK{}.DAT", i), content(i, 64)))
        .collect();
    let as_refs: Vec<(&str, &[u8])> = files.iter().map(|(n, d)| (n.as_str(), d.as_slice())).collect();
    let full = release("titleb", Language::EnAny, Platform::Dos, &as_refs);
    let partial = release("titleb", Language::EnAny, Platform::Dos, &as_refs[..3]);
    let db = database(vec![partial, full]);

    let mut tree = MemoryTree::new();
    for (name, data) in &files {
        tree = tree.file(name, data.clone());
    }
    let report = Resolver::with_defaults(&db).unwrap().scan(&*tree.build());
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].evidence.len(), 5);
    assert_eq!(report.matches[0].signature_index, 1);
}

#[test]
fn repeated_scans_are_identical() {
    let db = title_a_db();
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[("game.dat", b"not catalogued"), ("data/extra.bin", b"x")],
    );
    let resolver = Resolver::with_defaults(&db).unwrap();
    let first = resolver.scan_path(dir.path()).unwrap().to_json_string().unwrap();
    let second = resolver.scan_path(dir.path()).unwrap().to_json_string().unwrap();
    assert_eq!(first, second);
}

#[test]
fn denylisted_release_is_flagged_not_resolved() {
    let mut data = title_a_db().to_catalog();
    data.denylist.push(DenylistEntry {
        fingerprint: fp(b"title a, english floppy"),
        game_id: Some("titlea".into()),
        note: "Bad rip of the floppy release".into(),
    });
    let db = SignatureDatabase::from_catalog(data).unwrap();
    let root = MemoryTree::new()
        .file("GAME.DAT", b"title a, english floppy".to_vec())
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);

    assert_eq!(report.matches.len(), 1);
    assert!(report.matches[0].corrupted);
    assert_eq!(report.matches[0].confidence, Confidence::Exact);
    let warnings: Vec<_> = report.issues_of(DetectionIssueKind::KnownCorruptedMatch).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("Bad rip"));
    assert!(report.resolve(&db).is_none());
}

#[test]
fn unknown_content_is_reported_and_falls_through() {
    let db = title_a_db();
    let root = MemoryTree::new()
        .file("GAME.DAT", b"a dump nobody has seen".to_vec())
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);

    assert_eq!(report.unknown_fingerprints.len(), 1);
    let unknown = &report.unknown_fingerprints[0];
    assert_eq!(unknown.fingerprint, fp(b"a dump nobody has seen"));
    assert_eq!(unknown.file_name, "GAME.DAT");
    assert_eq!(report.issues_of(DetectionIssueKind::UnknownFingerprint).count(), 1);

    // Both languages survive an empty battery and are surfaced together.
    assert_eq!(report.matches.len(), 2);
    assert!(report.matches.iter().all(|m| m.confidence == Confidence::Heuristic));
    assert!(report.is_ambiguous());
}

#[test]
fn heuristics_can_be_disabled() {
    let db = title_a_db();
    let root = MemoryTree::new()
        .file("GAME.DAT", b"a dump nobody has seen".to_vec())
        .build();
    let mut config = ResolverConfig::default();
    config.matching.allow_heuristic = false;
    config.fingerprint.report_unknown = false;
    let report = Resolver::new(&db, config).unwrap().scan(&*root);
    assert!(report.matches.is_empty());
    assert!(report.unknown_fingerprints.is_empty());
}

#[test]
fn language_override_filters_results() {
    let db = title_a_db();
    let root = MemoryTree::new()
        .file("GAME.DAT", b"a dump nobody has seen".to_vec())
        .build();
    let mut config = ResolverConfig::default();
    config.overrides.language = Some(Language::DeDeu);
    let report = Resolver::new(&db, config).unwrap().scan(&*root);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].resolved_language, Language::DeDeu);
}

#[test]
fn scan_for_game_ignores_other_titles() {
    let db = database(vec![
        release("titlea", Language::EnAny, Platform::Dos, &[("GAME.DAT", b"a")]),
        release("titlec", Language::EnAny, Platform::Dos, &[("TITLEC.DAT", b"c")]),
    ]);
    let root = MemoryTree::new()
        .file("GAME.DAT", b"a".to_vec())
        .file("TITLEC.DAT", b"c".to_vec())
        .build();
    let resolver = Resolver::with_defaults(&db).unwrap();
    assert_eq!(resolver.scan(&*root).matches.len(), 2);

    let only = resolver.scan_for_game(&*root, "TITLEC");
    assert_eq!(only.matches.len(), 1);
    assert_eq!(only.matches[0].game_id(), "titlec");
    assert_eq!(only.stats.signatures_considered, 1);
}

#[test]
fn empty_catalogue_matches_nothing() {
    let db = SignatureDatabase::from_catalog(CatalogData::default()).unwrap();
    let root = MemoryTree::new().file("GAME.DAT", b"a".to_vec()).build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);
    assert!(report.matches.is_empty());
    assert_eq!(report.stats.signatures_considered, 0);
}

#[test]
fn each_requirement_is_digested_under_its_own_cap() {
    let rooms = content(6, 8_000);
    let mut patched = rooms.clone();
    patched[5_000..].fill(0xAA);
    let music = content(7, 9_000);

    let prefix_only = Fingerprint::of_prefix(&rooms, FingerprintCap::PREFIX_5000);
    let whole = Fingerprint::of_prefix(&music, FingerprintCap::WHOLE_FILE_MIB);
    assert_ne!(whole, Fingerprint::of_prefix(&music, FingerprintCap::PREFIX_5000));

    let db = database(vec![
        CandidateSignature::new("one", "one").with_file(
            FileRequirement::literal("ROOMS.DAT")
                .with_fingerprint(prefix_only)
                .with_cap(FingerprintCap::PREFIX_5000),
        ),
        CandidateSignature::new("two", "two").with_file(
            FileRequirement::literal("MUSIC.DAT")
                .with_fingerprint(whole)
                .with_cap(FingerprintCap::WHOLE_FILE_MIB),
        ),
    ]);
    let root = MemoryTree::new()
        .file("ROOMS.DAT", patched)
        .file("MUSIC.DAT", music)
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);

    let mut found: Vec<_> = report
        .matches
        .iter()
        .map(|m| (m.game_id().to_string(), m.confidence))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            ("one".to_string(), Confidence::Exact),
            ("two".to_string(), Confidence::Exact)
        ]
    );
    assert!(report.unknown_fingerprints.is_empty());
}
