//! Prefix-digest engine family.
//!
//! Each release lists every file it needs with the digest of its first 5000
//! bytes, so these resolve exactly without the heuristic battery.

use crate::core::{
    CandidateSignature, FeatureFlags, FileRequirement, FileRole, Fingerprint, FingerprintCap,
    Language, Platform,
};
use crate::detection::naming::TitleEntry;

struct Release {
    game_id: &'static str,
    variant: &'static str,
    language: Language,
    platform: Platform,
    flags: FeatureFlags,
    files: &'static [(&'static str, FileRole, Fingerprint)],
}

const fn fp(literal: &str) -> Fingerprint {
    Fingerprint::from_hex_literal(literal)
}

const BASE: FileRole = FileRole::Detection;
const ICON: FileRole = FileRole::Icon;
const STRINGS: FileRole = FileRole::Strings;
const TABLES: FileRole = FileRole::Tables;
const DATA: FileRole = FileRole::Data;

const SIMON1_ICON: Fingerprint = fp("22107c24dfb31b66ac503c28a6e20b19");
const SIMON1_TABLES: Fingerprint = fp("d198a80de2c59e4a0cd24b98814849e8");
const SIMON2_ICON: Fingerprint = fp("72096a62d36e6034ea9fecc13b2dbdab");
const SIMON2_TABLES: Fingerprint = fp("2082f8d02075e590300478853a91ffd9");

const RELEASES: &[Release] = &[
    Release {
        game_id: "pn",
        variant: "Floppy",
        language: Language::EnAny,
        platform: Platform::Amiga,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("icon.tmp", ICON, fp("cd94091218ac2c46918fd3c0cbd81d5e")),
            ("night.dbm", BASE, fp("712c445d8e938956403a759978eab01b")),
            ("night.txt", STRINGS, fp("52630ad100f473a2cdc7c699536d6730")),
        ],
    },
    Release {
        game_id: "pn",
        variant: "Floppy",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("icon.out", ICON, fp("40d8347c3154bfa8b642d6860a4b9481")),
            ("night.dbm", BASE, fp("177311ae059243f6a2740e950585d786")),
            ("night.txt", STRINGS, fp("861fc1fa0864eef585f5865dee52e325")),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy Demo",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE.union(FeatureFlags::DEMO),
        files: &[
            ("gdemo", BASE, fp("2be4a21bc76e2fdc071867c130651439")),
            ("icon.dat", ICON, fp("55af3b4d93972bc58bfee38a86b76c3f")),
            ("stripped.txt", STRINGS, fp("33a2e329b97b2a349858d6a093159eb7")),
            ("tbllist", TABLES, fp("1247e024e1f13ca54c1e354120c7519c")),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("gamepc", BASE, fp("c392e494dcabed797b98cbcfc687b33a")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("c95a0a1ee973e19c2a1c5d12026c139f")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::CsCze,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE.union(FeatureFlags::FAN_TRANSLATION),
        files: &[
            ("gamepc", BASE, fp("62de24fc579b94fac7d3d23201b65b14")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("c95a0a1ee973e19c2a1c5d12026c139f")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::FrFra,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("gamepc", BASE, fp("34759d0d4285a2f4b21b8e03b8fcefb3")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("aa01e7386057abc0c3e27dbaa9c4ba5b")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::DeDeu,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("gamepc", BASE, fp("063015e6ce7d90b570dbc21fe0c667b1")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("c95a0a1ee973e19c2a1c5d12026c139f")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::ItIta,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("gamepc", BASE, fp("65c9b2dea57df84ef55d1eaf384ebd30")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("2af9affc5981eec44b90d4c556145cb8")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "Floppy",
        language: Language::EsEsp,
        platform: Platform::Dos,
        flags: FeatureFlags::OLD_BUNDLE,
        files: &[
            ("gamepc", BASE, fp("5374fafdea2068134f33deab225feed3")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("2af9affc5981eec44b90d4c556145cb8")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD Demo",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::DEMO),
        files: &[
            ("simon.gme", DATA, fp("b4a7526ced425ba8ad0d548d0ec69900")),
            ("gamepc", BASE, fp("425c7d1957699d35abca7e12a08c7422")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("stripped.txt", STRINGS, fp("d9de7542612d9f4e0819ad0df5eac56b")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gamepc", BASE, fp("28261b99cd9da1242189b4f6f2841bd6")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("simon.gme", DATA, fp("64958b3a38afdcb85da1eeed85169806")),
            ("stripped.txt", STRINGS, fp("f3b27a3fbb45dcd323a48159496e45e8")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD",
        language: Language::FrFra,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gamepc", BASE, fp("3cfb9d1ff4ec725af9924140126cf69f")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("simon.gme", DATA, fp("638049fa5d41b81fb6fb11671721b871")),
            ("stripped.txt", STRINGS, fp("ef51ac74c946881ae4d7ca66cc7a0d1e")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD",
        language: Language::HeIsr,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gamepc", BASE, fp("bc66e9c0b296e1b155a246917133f71a")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("simon.gme", DATA, fp("a34b2c8642f2e3676d7088b5c8b3e884")),
            ("stripped.txt", STRINGS, fp("9d31bef42db1a8abe4e9f368014df1d5")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD",
        language: Language::ItIta,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gamepc", BASE, fp("8d3ca654e158c91b860c7eae31d65312")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("simon.gme", DATA, fp("52e315e0e02feca86d15cc82e3306b6c")),
            ("stripped.txt", STRINGS, fp("9d31bef42db1a8abe4e9f368014df1d5")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon1",
        variant: "CD",
        language: Language::EsEsp,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gamepc", BASE, fp("439f801ba52c02c9d1844600d1ce0f5e")),
            ("icon.dat", ICON, SIMON1_ICON),
            ("simon.gme", DATA, fp("eff2774a73890b9eac533db90cd1afa1")),
            ("stripped.txt", STRINGS, fp("9d31bef42db1a8abe4e9f368014df1d5")),
            ("tbllist", TABLES, SIMON1_TABLES),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "Floppy",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::empty(),
        files: &[
            ("game32", BASE, fp("604d04315935e77624bd356ac926e068")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("aa6840420899a31874204f90bb214108")),
            ("stripped.txt", STRINGS, fp("e229f84d46fa83f99b4a7115679f3fb6")),
            ("tbllist", TABLES, SIMON2_TABLES),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "Floppy",
        language: Language::RuRus,
        platform: Platform::Dos,
        flags: FeatureFlags::FAN_TRANSLATION,
        files: &[
            ("game32", BASE, fp("7edfc633dd50f8caa719c478443db70b")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("aa6840420899a31874204f90bb214108")),
            ("stripped.txt", STRINGS, fp("e229f84d46fa83f99b4a7115679f3fb6")),
            ("tbllist", TABLES, SIMON2_TABLES),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "Floppy",
        language: Language::DeDeu,
        platform: Platform::Dos,
        flags: FeatureFlags::empty(),
        files: &[
            ("game32", BASE, fp("eb6e3e37fe52993f948d7e2d6b869828")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("5fa9d080b04c610f526bd685be1bf747")),
            ("stripped.txt", STRINGS, fp("fd30df01cc248ecbaef302af855e0212")),
            ("tbllist", TABLES, SIMON2_TABLES),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "Floppy",
        language: Language::ItIta,
        platform: Platform::Dos,
        flags: FeatureFlags::empty(),
        files: &[
            ("game32", BASE, fp("3e11d400bea0638f360a724687005cd1")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("f306a397565d7f13bec7ecf14c723de7")),
            ("stripped.txt", STRINGS, fp("bea6843fb9f3b2144fcb146d62db0b9a")),
            ("tbllist", TABLES, SIMON2_TABLES),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "CD Demo",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::DEMO),
        files: &[
            ("gsptr30", BASE, fp("3794c15887539b8578bacab694ccf08a")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("f8c9e6df1e55923a749e115ba74210c4")),
            ("stripped.txt", STRINGS, fp("e229f84d46fa83f99b4a7115679f3fb6")),
            ("tbllist", TABLES, fp("a0d5a494b5d3d209d1a1d76cc8d76601")),
        ],
    },
    Release {
        game_id: "simon2",
        variant: "CD",
        language: Language::EnAny,
        platform: Platform::Dos,
        flags: FeatureFlags::TALKIE.union(FeatureFlags::CD),
        files: &[
            ("gsptr30", BASE, fp("8c301fb9c4fcf119d2730ccd2a565eb3")),
            ("icon.dat", ICON, SIMON2_ICON),
            ("simon2.gme", DATA, fp("9c535d403966750ae98bdaf698375a38")),
            ("stripped.txt", STRINGS, fp("e229f84d46fa83f99b4a7115679f3fb6")),
            ("tbllist", TABLES, SIMON2_TABLES),
        ],
    },
];

fn title_of(game_id: &str) -> &'static str {
    match game_id {
        "pn" => "Personal Nightmare",
        "simon1" => "Simon the Sorcerer 1",
        "simon2" => "Simon the Sorcerer 2",
        _ => "",
    }
}

pub(super) fn signatures() -> Vec<CandidateSignature> {
    RELEASES
        .iter()
        .map(|r| {
            let mut sig = CandidateSignature::new(r.game_id, title_of(r.game_id))
                .with_variant(r.variant)
                .with_platform(r.platform)
                .with_language(r.language)
                .with_flags(r.flags);
            for &(name, role, fingerprint) in r.files {
                sig = sig.with_file(
                    FileRequirement::literal(name)
                        .with_role(role)
                        .with_fingerprint(fingerprint)
                        .with_cap(FingerprintCap::PREFIX_5000),
                );
            }
            sig
        })
        .collect()
}

pub(super) fn titles() -> Vec<TitleEntry> {
    vec![
        TitleEntry::new("pn", title_of("pn")).on(Platform::Amiga),
        TitleEntry::new("simon1", title_of("simon1")),
        TitleEntry::new("simon2", title_of("simon2")),
    ]
}
