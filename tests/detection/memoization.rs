use assetid::core::{Language, Platform};
use assetid::detection::{MemoryTree, Resolver, ResolverConfig};

use crate::common::{content, database, release};

fn shared_files_db() -> assetid::SignatureDatabase {
    let icon = content(1, 256);
    let tables = content(2, 128);
    database(vec![
        release(
            "titlea",
            Language::EnAny,
            Platform::Dos,
            &[("GAMEPC", &content(3, 512)), ("ICON.DAT", &icon), ("TBLLIST", &tables)],
        ),
        release(
            "titlea",
            Language::FrFra,
            Platform::Dos,
            &[("GAMEPC", &content(4, 512)), ("ICON.DAT", &icon), ("TBLLIST", &tables)],
        ),
        release(
            "titlea",
            Language::DeDeu,
            Platform::Dos,
            &[("GAMEPC", &content(5, 512)), ("ICON.DAT", &icon), ("TBLLIST", &tables)],
        ),
    ])
}

fn tree() -> MemoryTree {
    MemoryTree::new()
        .file("gamepc", content(5, 512))
        .file("icon.dat", content(1, 256))
        .file("tbllist", content(2, 128))
        .file("readme.txt", b"unrelated".to_vec())
}

#[test]
fn each_file_is_read_once_per_scan() {
    let db = shared_files_db();
    let root = tree().build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].resolved_language, Language::DeDeu);
    assert_eq!(root.read_count("gamepc"), 1);
    assert_eq!(root.read_count("icon.dat"), 1);
    assert_eq!(root.read_count("tbllist"), 1);
    assert_eq!(root.read_count("readme.txt"), 0);
}

#[test]
fn parallel_prefetch_keeps_single_reads() {
    let db = shared_files_db();
    let root = tree().build();
    let mut config = ResolverConfig::default();
    config.fingerprint.parallel_prefetch = true;
    let report = Resolver::new(&db, config).unwrap().scan(&*root);

    assert_eq!(report.matches.len(), 1);
    assert_eq!(root.total_reads(), 3);
    assert_eq!(root.read_count("readme.txt"), 0);
}

#[test]
fn a_new_scan_starts_from_scratch() {
    let db = shared_files_db();
    let root = tree().build();
    let resolver = Resolver::with_defaults(&db).unwrap();
    resolver.scan(&*root);
    resolver.scan(&*root);
    assert_eq!(root.read_count("gamepc"), 2);
}
