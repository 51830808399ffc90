//! Secondary-evidence tables for the families that share a detection file.

use crate::core::{FeatureFlags, Platform};
use crate::detection::heuristics::{
    Admission, HeaderRule, HeuristicRules, SiblingClause, SiblingRule, StructuralException,
    VersionGate,
};

const OLD_ROOMS: &str = "00.lfl";
const ROOMS: &str = "000.lfl";

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn clause(present: &[&str], absent: &[&str]) -> SiblingClause {
    SiblingClause {
        present: names(present),
        absent: names(absent),
    }
}

fn sibling(family: &str, game_id: &str, only_flags: FeatureFlags, clauses: Vec<SiblingClause>) -> SiblingRule {
    SiblingRule {
        family: family.to_string(),
        game_id: game_id.to_string(),
        clauses,
        only_flags,
    }
}

fn gate(families: &[&str], min_version: Option<u8>, max_version: Option<u8>) -> VersionGate {
    VersionGate {
        families: names(families),
        min_version,
        max_version,
    }
}

fn header(offset: usize, magic: &[u8], admit: Admission) -> HeaderRule {
    HeaderRule {
        family: OLD_ROOMS.to_string(),
        offset,
        magic: magic.to_vec(),
        admit,
    }
}

pub(super) fn heuristics() -> HeuristicRules {
    let version_gates = vec![
        gate(&[OLD_ROOMS], Some(1), Some(3)),
        gate(&[ROOMS], Some(4), Some(4)),
        gate(
            &[
                "00.man",
                "maniac1.d64",
                "zak1.d64",
                "maniac mansion (e).prg",
                "maniac mansion (f).prg",
                "maniac mansion (sw).prg",
                "maniac mansion (u).prg",
                "maniac mansion (g).prg",
            ],
            None,
            Some(3),
        ),
        gate(&[], Some(5), None),
    ];

    let header_rules = vec![
        header(
            0,
            &[0xBC, 0xB9],
            Admission {
                game_ids: names(&["maniac"]),
                platform: Some(Platform::Nes),
                ..Admission::default()
            },
        ),
        header(
            0,
            &[0xCE, 0xF5],
            Admission {
                min_version: Some(1),
                max_version: Some(1),
                ..Admission::default()
            },
        ),
        header(
            0,
            &[0xFF, 0xFE],
            Admission {
                min_version: Some(2),
                max_version: Some(3),
                require_flags: FeatureFlags::OLD_BUNDLE,
                ..Admission::default()
            },
        ),
        header(
            4,
            b"0R",
            Admission {
                min_version: Some(3),
                max_version: Some(3),
                forbid_flags: FeatureFlags::OLD_BUNDLE,
                ..Admission::default()
            },
        ),
    ];

    let old = FeatureFlags::OLD_BUNDLE;
    let sibling_rules = vec![
        sibling(OLD_ROOMS, "indy3", old, vec![clause(&["98.LFL", "84.LFL"], &[])]),
        sibling(OLD_ROOMS, "zak", old, vec![clause(&["58.LFL"], &["98.LFL", "86.LFL", "84.LFL"])]),
        sibling(
            OLD_ROOMS,
            "maniac",
            old,
            vec![clause(&[], &["98.LFL", "86.LFL", "84.LFL", "58.LFL"])],
        ),
        sibling(
            OLD_ROOMS,
            "loom",
            old,
            vec![
                clause(&["86.LFL"], &["84.LFL", "98.LFL"]),
                clause(&["84.LFL"], &["86.LFL", "98.LFL"]),
            ],
        ),
        sibling(ROOMS, "pass", FeatureFlags::empty(), vec![clause(&[], &["903.LFL", "DISK02.LEC"])]),
        sibling(ROOMS, "loom", FeatureFlags::empty(), vec![clause(&["903.LFL"], &["DISK02.LEC"])]),
    ];

    let exceptions = vec![
        StructuralException::DemoBySibling {
            family: ROOMS.to_string(),
            game_id: "monkey".to_string(),
            marker: "903.LFL".to_string(),
        },
        StructuralException::VariantBySiblingCount {
            family: ROOMS.to_string(),
            game_id: "monkey".to_string(),
            pattern: "disk%02d.lec".to_string(),
            first: 1,
            last: 9,
            threshold: 5,
            at_least: names(&["EGA", "No Adlib"]),
            below: names(&["VGA"]),
        },
    ];

    HeuristicRules {
        version_gates,
        header_rules,
        sibling_rules,
        exceptions,
    }
}
