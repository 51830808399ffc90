//! Room/disk engine family.
//!
//! These releases are catalogued by filename pattern only: every pattern row
//! is expanded against the title's variant table and the heuristic battery
//! in [`super::rules`] tells the resulting candidates apart.

use crate::core::{
    CandidateSignature, ContainerHint, FeatureFlags, FileRequirement, GenerationRule, Language,
    Platform,
};
use crate::detection::naming::{ObsoleteId, TitleEntry};
use crate::detection::patterns::PackedExecutable;

/// Flags shared by the first engine generations.
const EARLY: FeatureFlags = FeatureFlags::SMALL_HEADER
    .union(FeatureFlags::SIXTEEN_COLOR)
    .union(FeatureFlags::USE_KEY)
    .union(FeatureFlags::OLD_BUNDLE);
const EARLY_DEMO: FeatureFlags = EARLY.union(FeatureFlags::DEMO);
const SMALL_256: FeatureFlags = FeatureFlags::SMALL_HEADER;
const SMALL_256_TRACKS: FeatureFlags = FeatureFlags::SMALL_HEADER.union(FeatureFlags::AUDIO_TRACKS);
const SMALL_KEY: FeatureFlags = FeatureFlags::SMALL_HEADER.union(FeatureFlags::USE_KEY);
const SMALL_KEY_16: FeatureFlags = SMALL_KEY.union(FeatureFlags::SIXTEEN_COLOR);
const KEY: FeatureFlags = FeatureFlags::USE_KEY;
const KEY_TRACKS: FeatureFlags = FeatureFlags::USE_KEY.union(FeatureFlags::AUDIO_TRACKS);
const NONE: FeatureFlags = FeatureFlags::empty();
const DEMO: FeatureFlags = FeatureFlags::DEMO;
const KEY_DEMO: FeatureFlags = FeatureFlags::USE_KEY.union(FeatureFlags::DEMO);

const UNK: Platform = Platform::Unknown;
const ANY_LANG: Language = Language::Unknown;

struct Title {
    game_id: &'static str,
    name: &'static str,
    platform: Platform,
}

const fn title(game_id: &'static str, name: &'static str) -> Title {
    Title { game_id, name, platform: Platform::Dos }
}

const TITLES: &[Title] = &[
    title("maniac", "Maniac Mansion"),
    title("zak", "Zak McKracken and the Alien Mindbenders"),
    title("indy3", "Indiana Jones and the Last Crusade"),
    title("loom", "Loom"),
    title("pass", "Passport to Adventure"),
    title("monkey", "The Secret of Monkey Island"),
    title("monkey2", "Monkey Island 2: LeChuck's Revenge"),
    title("atlantis", "Indiana Jones and the Fate of Atlantis"),
    title("tentacle", "Day of the Tentacle"),
    title("samnmax", "Sam & Max Hit the Road"),
    title("ft", "Full Throttle"),
    title("dig", "The Dig"),
    Title { game_id: "comi", name: "The Curse of Monkey Island", platform: Platform::Windows },
    title("puttmoon", "Putt-Putt Goes to the Moon"),
    title("puttputt", "Putt-Putt Joins the Parade"),
    title("fbear", "Fatty Bear's Birthday Surprise"),
    title("freddi", "Freddi Fish 1: The Case of the Missing Kelp Seeds"),
    title("airport", "Let's Explore the Airport with Buzzy"),
    title("puttzoo", "Putt-Putt Saves the Zoo"),
    title("pajama", "Pajama Sam 1: No Need to Hide When It's Dark Outside"),
    title("spyfox", "SPY Fox 1: Dry Cereal"),
];

/// One engine configuration of a title. An empty tag is the default variant.
struct Variant {
    game_id: &'static str,
    tag: &'static str,
    version: u8,
    flags: FeatureFlags,
    platform: Platform,
}

const fn v(
    game_id: &'static str,
    tag: &'static str,
    version: u8,
    flags: FeatureFlags,
    platform: Platform,
) -> Variant {
    Variant { game_id, tag, version, flags, platform }
}

const VARIANTS: &[Variant] = &[
    v("maniac", "C64", 0, EARLY, Platform::C64),
    v("maniac", "V1", 1, EARLY, Platform::Dos),
    v("maniac", "NES", 1, EARLY, Platform::Nes),
    v("maniac", "V2", 2, EARLY, UNK),
    v("maniac", "Demo", 2, EARLY_DEMO, Platform::Dos),
    v("zak", "V1", 1, EARLY, UNK),
    v("zak", "V2", 2, EARLY, UNK),
    v("zak", "FM-TOWNS", 3, SMALL_256_TRACKS, Platform::FmTowns),
    v("indy3", "EGA", 3, EARLY, UNK),
    v("indy3", "No Adlib", 3, EARLY, UNK),
    v("indy3", "VGA", 3, SMALL_256, Platform::Dos),
    v("indy3", "FM-TOWNS", 3, SMALL_256_TRACKS, Platform::FmTowns),
    v("loom", "EGA", 3, EARLY, UNK),
    v("loom", "No Adlib", 3, EARLY, UNK),
    v("loom", "FM-TOWNS", 3, SMALL_256_TRACKS, Platform::FmTowns),
    v("loom", "VGA", 4, SMALL_KEY.union(FeatureFlags::AUDIO_TRACKS), Platform::Dos),
    v("pass", "", 4, SMALL_KEY_16, Platform::Dos),
    v("monkey", "VGA", 4, SMALL_KEY, Platform::Dos),
    v("monkey", "EGA", 4, SMALL_KEY_16, Platform::Dos),
    v("monkey", "No Adlib", 4, SMALL_KEY_16, Platform::AtariSt),
    v("monkey", "Demo", 4, SMALL_KEY_16.union(DEMO), Platform::Dos),
    v("monkey", "CD", 5, KEY_TRACKS, UNK),
    v("monkey", "FM-TOWNS", 5, KEY_TRACKS, Platform::FmTowns),
    v("monkey", "SEGA", 5, KEY_TRACKS, Platform::SegaCd),
    v("monkey2", "", 5, KEY, UNK),
    v("atlantis", "", 5, KEY, UNK),
    v("tentacle", "", 6, KEY, UNK),
    v("samnmax", "", 6, KEY, UNK),
    v("ft", "", 7, NONE, UNK),
    v("ft", "Demo", 7, DEMO, UNK),
    v("dig", "", 7, NONE, UNK),
    v("dig", "Demo", 7, DEMO, UNK),
    v("comi", "", 8, NONE, Platform::Windows),
    v("comi", "Demo", 8, DEMO, Platform::Windows),
    v("puttmoon", "", 6, KEY, UNK),
    v("puttputt", "HE 61", 6, KEY, UNK),
    v("puttputt", "HE 60", 6, KEY, Platform::Dos),
    v("puttputt", "Demo", 6, KEY_DEMO, UNK),
    v("fbear", "HE 61", 6, KEY, UNK),
    v("fbear", "HE 70", 6, KEY, Platform::Windows),
    v("freddi", "", 6, KEY, UNK),
    v("airport", "", 6, KEY, UNK),
    v("puttzoo", "", 6, KEY, UNK),
    v("pajama", "", 6, KEY, UNK),
    v("spyfox", "", 6, KEY, UNK),
];

#[derive(Clone, Copy)]
enum Gen {
    AsIs,
    Room,
    Disk,
    HePc,
    HeMac,
    HeMacNoParens,
    /// Mac data file, possibly dumped as MacBinary.
    Fork,
    /// C64 disk image; the second disk must sit next to it.
    D64,
    /// Index file carried inside the host executable.
    Packed,
}

/// A detection filename pattern for a title. `variant` pins the row to one
/// variant; `None` expands to all of them.
struct PatternRow {
    game_id: &'static str,
    pattern: &'static str,
    gen: Gen,
    language: Language,
    platform: Platform,
    variant: Option<&'static str>,
}

const fn p(game_id: &'static str, pattern: &'static str, gen: Gen) -> PatternRow {
    PatternRow { game_id, pattern, gen, language: ANY_LANG, platform: UNK, variant: None }
}

const fn mac(game_id: &'static str, pattern: &'static str, gen: Gen) -> PatternRow {
    PatternRow { game_id, pattern, gen, language: ANY_LANG, platform: Platform::Macintosh, variant: None }
}

const fn pinned(
    game_id: &'static str,
    pattern: &'static str,
    gen: Gen,
    language: Language,
    platform: Platform,
    variant: &'static str,
) -> PatternRow {
    PatternRow { game_id, pattern, gen, language, platform, variant: Some(variant) }
}

const PATTERNS: &[PatternRow] = &[
    p("maniac", "%02d.LFL", Gen::Room),
    pinned("maniac", "%02d.MAN", Gen::Room, ANY_LANG, UNK, "Demo"),
    pinned("maniac", "maniac1.d64", Gen::D64, ANY_LANG, Platform::C64, "C64"),
    pinned("maniac", "Maniac Mansion (E).prg", Gen::AsIs, Language::EnGrb, Platform::Nes, "NES"),
    pinned("maniac", "Maniac Mansion (F).prg", Gen::AsIs, Language::FrFra, Platform::Nes, "NES"),
    pinned("maniac", "Maniac Mansion (SW).prg", Gen::AsIs, Language::SeSwe, Platform::Nes, "NES"),
    pinned("maniac", "Maniac Mansion (U).prg", Gen::AsIs, Language::EnUsa, Platform::Nes, "NES"),
    pinned("maniac", "Maniac Mansion (G).prg", Gen::AsIs, Language::DeDeu, Platform::Nes, "NES"),
    p("zak", "%02d.LFL", Gen::Room),
    pinned("zak", "zak1.d64", Gen::D64, ANY_LANG, Platform::C64, "V1"),
    p("indy3", "%02d.LFL", Gen::Room),
    pinned("indy3", "%02d.LFL", Gen::Packed, ANY_LANG, Platform::Windows, "VGA"),
    pinned("indy3", "%02d.LFL", Gen::Packed, ANY_LANG, Platform::Macintosh, "VGA"),
    p("loom", "%02d.LFL", Gen::Room),
    pinned("loom", "%03d.LFL", Gen::Room, ANY_LANG, UNK, "VGA"),
    pinned("loom", "%03d.LFL", Gen::Packed, ANY_LANG, Platform::Windows, "VGA"),
    pinned("loom", "%03d.LFL", Gen::Packed, ANY_LANG, Platform::Macintosh, "VGA"),
    p("pass", "%03d.LFL", Gen::Room),
    p("monkey", "%03d.LFL", Gen::Room),
    p("monkey", "monkey.%03d", Gen::Disk),
    p("monkey", "monkey1.%03d", Gen::Disk),
    pinned("monkey", "monkeyk.%03d", Gen::Disk, Language::JaJpn, Platform::FmTowns, "FM-TOWNS"),
    pinned("monkey", "game.%03d", Gen::Disk, ANY_LANG, Platform::SegaCd, "SEGA"),
    p("monkey2", "monkey2.%03d", Gen::Disk),
    p("monkey2", "mi2demo.%03d", Gen::Disk),
    p("atlantis", "atlantis.%03d", Gen::Disk),
    p("atlantis", "fate.%03d", Gen::Disk),
    p("atlantis", "playfate.%03d", Gen::Disk),
    p("atlantis", "indy4.%03d", Gen::Disk),
    p("atlantis", "indydemo.%03d", Gen::Disk),
    mac("atlantis", "Fate of Atlantis Data", Gen::Fork),
    PatternRow {
        game_id: "atlantis",
        pattern: "atlantis.%03d",
        gen: Gen::Packed,
        language: ANY_LANG,
        platform: Platform::Windows,
        variant: None,
    },
    PatternRow {
        game_id: "atlantis",
        pattern: "atlantis.%03d",
        gen: Gen::Packed,
        language: ANY_LANG,
        platform: Platform::Macintosh,
        variant: None,
    },
    p("tentacle", "tentacle.%03d", Gen::Disk),
    p("tentacle", "dottdemo.%03d", Gen::Disk),
    mac("tentacle", "Day of the Tentacle Data", Gen::Fork),
    mac("tentacle", "Day of the Tentacle Demo Data", Gen::Fork),
    p("samnmax", "samnmax.%03d", Gen::Disk),
    p("samnmax", "samnmax.sm%d", Gen::Disk),
    mac("samnmax", "Sam & Max Data", Gen::Fork),
    mac("samnmax", "Sam & Max Demo Data", Gen::Fork),
    PatternRow {
        game_id: "samnmax",
        pattern: "ramnmax.%03d",
        gen: Gen::Disk,
        language: Language::RuRus,
        platform: UNK,
        variant: None,
    },
    p("samnmax", "samdemo.%03d", Gen::Disk),
    p("samnmax", "snmdemo.%03d", Gen::Disk),
    p("samnmax", "snmidemo.%03d", Gen::Disk),
    p("samnmax", "sdemo.sm%d", Gen::Disk),
    p("dig", "dig.la%d", Gen::Disk),
    mac("dig", "The Dig Data", Gen::Fork),
    pinned("dig", "The Dig Demo Data", Gen::Fork, ANY_LANG, Platform::Macintosh, "Demo"),
    p("ft", "ft.la%d", Gen::Disk),
    pinned("ft", "ft.%03d", Gen::Disk, ANY_LANG, UNK, "Demo"),
    pinned("ft", "ftdemo.la%d", Gen::Disk, ANY_LANG, UNK, "Demo"),
    mac("ft", "Full Throttle Data", Gen::Fork),
    pinned("ft", "Full Throttle Demo Data", Gen::Fork, ANY_LANG, Platform::Macintosh, "Demo"),
    mac("ft", "Vollgas Data", Gen::Fork),
    pinned("ft", "Vollgas Demo Data", Gen::Fork, ANY_LANG, Platform::Macintosh, "Demo"),
    p("comi", "comi.la%d", Gen::Disk),
    p("fbear", "fbear", Gen::HePc),
    p("fbear", "fbdemo", Gen::HePc),
    mac("fbear", "Fatty Bear Demo", Gen::HeMacNoParens),
    mac("fbear", "Fatty Bear", Gen::HeMacNoParens),
    p("puttmoon", "puttmoon", Gen::HePc),
    p("puttmoon", "moondemo", Gen::HePc),
    mac("puttmoon", "Putt-Putt Moon Demo", Gen::HeMacNoParens),
    mac("puttmoon", "Putt-Putt Moon", Gen::HeMacNoParens),
    p("puttputt", "puttputt", Gen::HePc),
    p("puttputt", "puttdemo", Gen::HePc),
    mac("puttputt", "Putt-Putt's Demo", Gen::HeMacNoParens),
    mac("puttputt", "Putt-Putt Parade", Gen::HeMacNoParens),
    p("airport", "airport", Gen::HePc),
    p("airport", "airdemo", Gen::HePc),
    mac("airport", "Airport Demo", Gen::HeMac),
    mac("airport", "The AirPort", Gen::HeMac),
    p("freddi", "freddi", Gen::HePc),
    p("freddi", "freddemo", Gen::HePc),
    mac("freddi", "Freddi Demo", Gen::HeMac),
    mac("freddi", "Freddi Fish", Gen::HeMac),
    p("freddi", "FreddiD", Gen::HePc),
    p("puttzoo", "puttzoo", Gen::HePc),
    mac("puttzoo", "Puttzoo Demo", Gen::HeMac),
    mac("puttzoo", "PuttZoo", Gen::HeMac),
    p("puttzoo", "zoodemo", Gen::HePc),
    mac("puttzoo", "Zoo Demo", Gen::HeMac),
    p("pajama", "pajama", Gen::HePc),
    mac("pajama", "Pajama Sam", Gen::HeMac),
    p("pajama", "PJS-DEMO", Gen::HePc),
    p("spyfox", "spyfox", Gen::HePc),
    mac("spyfox", "SPYFox", Gen::HeMac),
    p("spyfox", "foxdemo", Gen::HePc),
];

const OBSOLETE: &[(&str, &str, Option<Platform>)] = &[
    ("comidemo", "comi", None),
    ("digdemo", "dig", None),
    ("digdemoMac", "dig", Some(Platform::Macintosh)),
    ("dottdemo", "tentacle", None),
    ("fate", "atlantis", None),
    ("ftMac", "ft", Some(Platform::Macintosh)),
    ("ftpcdemo", "ft", None),
    ("ftdemo", "ft", Some(Platform::Macintosh)),
    ("game", "monkey", None),
    ("indy3ega", "indy3", None),
    ("indy3towns", "indy3", Some(Platform::FmTowns)),
    ("indy4", "atlantis", Some(Platform::FmTowns)),
    ("indydemo", "atlantis", Some(Platform::FmTowns)),
    ("loomcd", "loom", None),
    ("loomTowns", "loom", Some(Platform::FmTowns)),
    ("mi2demo", "monkey2", None),
    ("monkey1", "monkey", None),
    ("monkeyEGA", "monkey", None),
    ("monkeyVGA", "monkey", None),
    ("playfate", "atlantis", None),
    ("samnmax-alt", "samnmax", None),
    ("samnmaxMac", "samnmax", Some(Platform::Macintosh)),
    ("samdemo", "samnmax", None),
    ("samdemoMac", "samnmax", Some(Platform::Macintosh)),
    ("snmdemo", "samnmax", None),
    ("snmidemo", "samnmax", None),
    ("tentacleMac", "tentacle", Some(Platform::Macintosh)),
    ("zakTowns", "zak", Some(Platform::FmTowns)),
];

/// Digital re-releases whose index file lives inside the executable:
/// `(game, platform, pattern, index file, executable, offset, length)`.
const PACKED: &[(&str, Platform, &str, &str, &str, u64, u64)] = &[
    (
        "indy3",
        Platform::Windows,
        "%02d.LFL",
        "00.LFL",
        "Indiana Jones and the Last Crusade.exe",
        162_056,
        6_295,
    ),
    ("indy3", Platform::Macintosh, "%02d.LFL", "00.LFL", "The Last Crusade", 150_368, 6_295),
    (
        "atlantis",
        Platform::Windows,
        "atlantis.%03d",
        "ATLANTIS.000",
        "Indiana Jones and the Fate of Atlantis.exe",
        224_336,
        12_035,
    ),
    (
        "atlantis",
        Platform::Macintosh,
        "atlantis.%03d",
        "ATLANTIS.000",
        "The Fate of Atlantis",
        260_224,
        12_035,
    ),
    ("loom", Platform::Windows, "%03d.LFL", "000.LFL", "Loom.exe", 187_248, 8_307),
    ("loom", Platform::Macintosh, "%03d.LFL", "000.LFL", "Loom", 170_464, 8_307),
];

impl PatternRow {
    fn requirement(&self) -> FileRequirement {
        let (rule, container) = match self.gen {
            Gen::AsIs => (GenerationRule::Literal, ContainerHint::Auto),
            Gen::Room => (GenerationRule::RoomNumber, ContainerHint::Auto),
            Gen::Disk => (GenerationRule::DiskNumber, ContainerHint::Auto),
            Gen::HePc => (GenerationRule::HumongousPc, ContainerHint::Auto),
            Gen::HeMac => (GenerationRule::HumongousMac, ContainerHint::Auto),
            Gen::HeMacNoParens => (GenerationRule::HumongousMacNoParens, ContainerHint::Auto),
            Gen::Fork => (GenerationRule::ResourceFork, ContainerHint::ResourceFork),
            Gen::D64 => (
                GenerationRule::Literal,
                ContainerHint::DiskImage {
                    inner_name: "00".to_string(),
                    needs_companion: true,
                },
            ),
            Gen::Packed => (
                GenerationRule::PackedExecutable {
                    title: self.game_id.to_string(),
                },
                ContainerHint::Auto,
            ),
        };
        FileRequirement::new(self.pattern, rule).with_container(container)
    }

    fn admits(&self, variant: &Variant) -> bool {
        variant.game_id == self.game_id
            && self.variant.map_or(true, |pin| pin.eq_ignore_ascii_case(variant.tag))
    }
}

fn title_of(game_id: &str) -> &'static str {
    TITLES
        .iter()
        .find(|t| t.game_id == game_id)
        .map_or("", |t| t.name)
}

/// Every pattern row crossed with the variants it admits, in row order.
pub(super) fn signatures() -> Vec<CandidateSignature> {
    let mut out = Vec::new();
    for row in PATTERNS {
        for variant in VARIANTS.iter().filter(|v| row.admits(v)) {
            let platform = if row.platform.is_known() {
                row.platform
            } else {
                variant.platform
            };
            let mut sig = CandidateSignature::new(row.game_id, title_of(row.game_id))
                .with_platform(platform)
                .with_language(row.language)
                .with_flags(variant.flags)
                .with_engine_version(variant.version)
                .with_file(row.requirement());
            if !variant.tag.is_empty() {
                sig = sig.with_variant(variant.tag);
            }
            out.push(sig);
        }
    }
    out
}

pub(super) fn titles() -> Vec<TitleEntry> {
    TITLES
        .iter()
        .map(|t| TitleEntry::new(t.game_id, t.name).on(t.platform))
        .collect()
}

pub(super) fn obsolete_ids() -> Vec<ObsoleteId> {
    OBSOLETE
        .iter()
        .map(|&(from, to, platform)| ObsoleteId {
            from: from.to_string(),
            to: to.to_string(),
            platform,
        })
        .collect()
}

pub(super) fn packed_executables() -> Vec<PackedExecutable> {
    PACKED
        .iter()
        .map(
            |&(title, platform, pattern, index_file, executable, offset, length)| PackedExecutable {
                title: title.to_string(),
                platform,
                pattern: pattern.to_string(),
                index_file: index_file.to_string(),
                executable: executable.to_string(),
                offset,
                length,
            },
        )
        .collect()
}
