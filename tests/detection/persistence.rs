use assetid::core::{Language, Platform, ResolvedTarget};
use assetid::detection::{MemoryTree, Resolver};
use assetid::SignatureDatabase;

use crate::common::{database, release};

#[test]
fn resolved_target_survives_the_config_file() {
    let db = database(vec![release(
        "titlea",
        Language::FrFra,
        Platform::Amiga,
        &[("GAME.DAT", b"amiga french")],
    )]);
    let root = MemoryTree::new()
        .file("GAME.DAT", b"amiga french".to_vec())
        .build();
    let report = Resolver::with_defaults(&db).unwrap().scan(&*root);
    let target = report.resolve(&db).unwrap();
    assert_eq!(target.target.as_deref(), Some("titlea-amiga-fr"));

    let text = target.to_config_string().unwrap();
    assert!(text.contains("gameid=titlea\n"));
    assert!(text.contains("language=fr\n"));
    assert!(text.contains("platform=amiga\n"));
    assert_eq!(ResolvedTarget::from_config_str(&text).unwrap(), target);

    let json = target.to_json_string().unwrap();
    assert_eq!(ResolvedTarget::from_json_str(&json).unwrap(), target);
}

#[test]
fn retired_ids_are_upgraded_on_load() {
    let db = SignatureDatabase::builtin();
    let mut target =
        ResolvedTarget::from_config_str("gameid=monkeyEGA\nlanguage=de\nplatform=pc\n").unwrap();
    assert!(db.upgrade_target(&mut target));
    assert_eq!(target.game_id, "monkey");
    assert_eq!(target.language, Language::DeDeu);
    assert_eq!(target.platform, Platform::Dos);

    let mut current = target.clone();
    assert!(!db.upgrade_target(&mut current));
    assert_eq!(current, target);
}

#[test]
fn upgraded_target_revalidates_against_its_game() {
    let db = SignatureDatabase::builtin();
    let mut target = ResolvedTarget::from_config_str("gameid=mi2demo\n").unwrap();
    db.upgrade_target(&mut target);
    assert_eq!(db.find_title(&target.game_id).unwrap().title, "Monkey Island 2: LeChuck's Revenge");

    let root = MemoryTree::new()
        .file("monkey2.000", vec![0; 32])
        .file("tentacle.000", vec![0; 32])
        .build();
    let resolver = Resolver::with_defaults(&db).unwrap();
    let report = resolver.scan_for_game(&*root, &target.game_id);
    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].game_id(), "monkey2");
}

#[test]
fn malformed_config_lines_are_rejected() {
    assert!(ResolvedTarget::from_config_str("gameid monkey").is_err());
    assert!(ResolvedTarget::from_config_str("language=de\n").is_err());
    assert!(ResolvedTarget::from_config_str("gameid=monkey\nplatform=toaster\n").is_err());
}
