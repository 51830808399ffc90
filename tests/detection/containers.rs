use assetid::core::{
    CandidateSignature, Confidence, ContainerHint, ContainerKind, FileRequirement,
    FingerprintCap, Language, Platform,
};
use assetid::detection::MemoryTree;
use assetid::Resolver;

use crate::common::{content, d64_with_file, database, fp, macbinary, release};

#[test]
fn macbinary_dump_matches_a_macintosh_release() {
    let inner = content(7, 900);
    let db = database(vec![release(
        "titlem",
        Language::EnAny,
        Platform::Macintosh,
        &[("Title Data", &inner)],
    )]);
    let root = MemoryTree::new()
        .file("Title Data", macbinary("Title Data", &inner, 300))
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);

    assert_eq!(report.matches.len(), 1);
    let file = &report.matches[0].evidence[0];
    assert_eq!(report.matches[0].confidence, Confidence::Exact);
    assert_eq!(file.container, Some(ContainerKind::MacBinary));
    assert_eq!(file.size, 900);
    assert_eq!(file.fingerprint, Some(fp(&inner)));
}

#[test]
fn wrapped_dump_does_not_stand_in_for_a_dos_release() {
    let inner = content(7, 900);
    let db = database(vec![release(
        "titlem",
        Language::EnAny,
        Platform::Dos,
        &[("Title Data", &inner)],
    )]);
    let root = MemoryTree::new()
        .file("Title Data", macbinary("Title Data", &inner, 0))
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);
    assert!(report.matches.iter().all(|m| !m.is_exact()));
}

#[test]
fn disk_image_needs_its_companion() {
    let index = content(9, 300);
    let sig = CandidateSignature::new("titlec", "Title C")
        .with_platform(Platform::C64)
        .with_file(
            FileRequirement::literal("title1.d64")
                .with_fingerprint(fp(&index))
                .with_cap(FingerprintCap::PREFIX_5000)
                .with_container(ContainerHint::DiskImage {
                    inner_name: "00".into(),
                    needs_companion: true,
                }),
        );
    let db = database(vec![sig]);
    let resolver = Resolver::with_defaults(&db).unwrap();

    let alone = MemoryTree::new()
        .file("title1.d64", d64_with_file("00", &index))
        .build();
    assert!(resolver.scan(&*alone).matches.is_empty());

    let pair = MemoryTree::new()
        .file("title1.d64", d64_with_file("00", &index))
        .file("title2.d64", d64_with_file("01", &content(1, 10)))
        .build();
    let report = resolver.scan(&*pair);
    assert_eq!(report.matches.len(), 1);
    let file = &report.matches[0].evidence[0];
    assert_eq!(report.matches[0].confidence, Confidence::Exact);
    assert_eq!(file.container, Some(ContainerKind::DiskImage));
    assert_eq!(file.size, 300);
}

#[test]
fn truncated_wrapper_is_just_unknown_content() {
    let inner = content(7, 900);
    let db = database(vec![release(
        "titlem",
        Language::EnAny,
        Platform::Macintosh,
        &[("Title Data", &inner)],
    )]);
    let mut wrapped = macbinary("Title Data", &inner, 300);
    wrapped.truncate(200);
    let root = MemoryTree::new().file("Title Data", wrapped).build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);
    assert!(report.matches.iter().all(|m| !m.is_exact()));
    assert_eq!(report.unknown_fingerprints.len(), 1);
}
