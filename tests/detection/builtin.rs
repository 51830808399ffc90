//! Pattern-only families of the builtin catalogue, told apart by the
//! heuristic battery.

use assetid::core::{Confidence, DetectionIssueKind, Platform};
use assetid::detection::{MemoryTree, Resolver, ScanReport};
use assetid::SignatureDatabase;

fn scan(tree: MemoryTree) -> (SignatureDatabase, ScanReport) {
    let db = SignatureDatabase::builtin();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*tree.build());
    (db, report)
}

fn ids(report: &ScanReport) -> Vec<(String, Option<String>)> {
    report
        .matches
        .iter()
        .map(|m| (m.game_id().to_string(), m.signature.variant_tag.clone()))
        .collect()
}

fn header(magic: &[u8]) -> Vec<u8> {
    let mut data = magic.to_vec();
    data.resize(64, 0x11);
    data
}

#[test]
fn v1_header_with_room_58_is_zak() {
    let (db, report) = scan(
        MemoryTree::new()
            .file("00.LFL", header(&[0xCE, 0xF5]))
            .file("58.LFL", vec![0; 16]),
    );
    assert_eq!(ids(&report), vec![("zak".to_string(), Some("V1".to_string()))]);
    assert_eq!(report.matches[0].confidence, Confidence::Heuristic);
    assert!(!report.is_ambiguous());
    let target = report.resolve(&db).unwrap();
    assert_eq!(target.game_id, "zak");
    assert_eq!(target.target.as_deref(), Some("zak-v1"));
}

#[test]
fn nes_header_only_admits_the_nes_port() {
    let (db, report) = scan(MemoryTree::new().file("00.LFL", header(&[0xBC, 0xB9])));
    assert_eq!(ids(&report), vec![("maniac".to_string(), Some("NES".to_string()))]);
    assert_eq!(report.matches[0].resolved_platform, Platform::Nes);
    assert_eq!(
        report.resolve(&db).unwrap().target.as_deref(),
        Some("maniac-nes")
    );
}

#[test]
fn old_bundle_siblings_pick_indy3_and_report_the_tie() {
    let (_, report) = scan(
        MemoryTree::new()
            .file("00.LFL", header(&[0xFF, 0xFE]))
            .file("84.LFL", vec![0; 16])
            .file("98.LFL", vec![0; 16]),
    );
    assert_eq!(
        ids(&report),
        vec![
            ("indy3".to_string(), Some("EGA".to_string())),
            ("indy3".to_string(), Some("No Adlib".to_string())),
        ]
    );
    assert!(report.is_ambiguous());
    let issue = report.issues_of(DetectionIssueKind::AmbiguousMatch).next().unwrap();
    assert!(issue.message.contains("indy3 (EGA)"));
}

fn v4_tree(disks: u32, with_903: bool) -> MemoryTree {
    let mut tree = MemoryTree::new()
        .file("000.LFL", vec![0; 64])
        .file("901.LFL", vec![0; 8])
        .file("902.LFL", vec![0; 8])
        .file("904.LFL", vec![0; 8]);
    if with_903 {
        tree = tree.file("903.LFL", vec![0; 8]);
    }
    for n in 1..=disks {
        tree = tree.file(&format!("DISK{:02}.LEC", n), vec![0; 8]);
    }
    tree
}

#[test]
fn four_disk_v4_set_is_monkey_vga() {
    let (db, report) = scan(v4_tree(4, true));
    assert_eq!(ids(&report), vec![("monkey".to_string(), Some("VGA".to_string()))]);
    assert_eq!(
        report.resolve(&db).unwrap().target.as_deref(),
        Some("monkey-vga")
    );
}

#[test]
fn eight_disk_v4_set_leaves_the_ega_releases() {
    let (_, report) = scan(v4_tree(8, true));
    assert_eq!(
        ids(&report),
        vec![
            ("monkey".to_string(), Some("EGA".to_string())),
            ("monkey".to_string(), Some("No Adlib".to_string())),
        ]
    );
    assert!(report.is_ambiguous());
}

#[test]
fn single_disk_without_903_is_pass_or_the_demo() {
    let (_, report) = scan(v4_tree(1, false));
    let found = ids(&report);
    assert!(found.contains(&("pass".to_string(), None)));
    assert!(found.contains(&("monkey".to_string(), Some("Demo".to_string()))));
    assert!(!found.iter().any(|(g, _)| g == "loom"));
}

#[test]
fn loom_cd_needs_903_and_one_disk() {
    let (_, report) = scan(v4_tree(1, true));
    let found = ids(&report);
    assert!(found.contains(&("loom".to_string(), Some("VGA".to_string()))));
    assert!(!found.iter().any(|(g, _)| g == "pass"));
}

#[test]
fn packed_executable_is_probed_on_its_platform() {
    let mut exe = vec![0x4Du8; 200_000];
    exe[1] = 0x5A;
    let (db, report) = scan(MemoryTree::new().file("Loom.exe", exe));
    assert_eq!(ids(&report), vec![("loom".to_string(), Some("VGA".to_string()))]);
    let m = &report.matches[0];
    assert_eq!(m.resolved_platform, Platform::Windows);
    assert_eq!(m.evidence[0].file_name, "Loom.exe");
    assert_eq!(
        report.resolve(&db).unwrap().target.as_deref(),
        Some("loom-vga-windows")
    );
}

#[test]
fn humongous_names_surface_every_variant() {
    let (_, report) = scan(MemoryTree::new().file("PUTTPUTT.HE0", vec![0; 32]));
    assert_eq!(report.matches.len(), 3);
    assert!(report.matches.iter().all(|m| m.game_id() == "puttputt"));
    assert!(report.is_ambiguous());
}

#[test]
fn resource_fork_names_match_with_and_without_bin() {
    for name in ["Day of the Tentacle Data", "Day of the Tentacle Data.bin"] {
        let (_, report) = scan(MemoryTree::new().file(name, vec![0; 32]));
        assert_eq!(report.matches.len(), 1, "{}", name);
        assert_eq!(report.matches[0].game_id(), "tentacle");
        assert_eq!(report.matches[0].resolved_platform, Platform::Macintosh);
    }
}

#[test]
fn c64_image_pair_is_maniac() {
    let lone = MemoryTree::new().file("maniac1.d64", vec![0; 1024]);
    assert!(scan(lone).1.matches.is_empty());

    let (_, report) = scan(
        MemoryTree::new()
            .file("maniac1.d64", vec![0; 1024])
            .file("maniac2.d64", vec![0; 1024]),
    );
    assert_eq!(ids(&report), vec![("maniac".to_string(), Some("C64".to_string()))]);
    assert_eq!(report.matches[0].resolved_platform, Platform::C64);
}

#[test]
fn disk_numbered_v5_files_pass_the_fallback_gate() {
    let (_, report) = scan(MemoryTree::new().file("monkey2.000", vec![0; 32]));
    assert_eq!(ids(&report), vec![("monkey2".to_string(), None)]);
}

#[test]
fn unreadable_detection_file_eliminates_its_family() {
    let (db, report) = scan(
        MemoryTree::new()
            .unreadable("00.LFL")
            .file("58.LFL", vec![0; 16]),
    );
    assert!(report.is_empty());
    assert!(report.resolve(&db).is_none());
    let failures: Vec<_> = report.issues_of(DetectionIssueKind::IoFailure).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].file.as_deref(), Some("00.LFL"));
}
