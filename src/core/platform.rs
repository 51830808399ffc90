//! Platform and language identifiers.
//!
//! Both enums serialize to the short lowercase codes used in persisted
//! targets (`pc`, `macintosh`, `en`, `de`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolverError;

/// Platform a release was published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Platform {
    #[serde(rename = "pc")]
    Dos,
    #[serde(rename = "windows")]
    Windows,
    #[serde(rename = "macintosh")]
    Macintosh,
    #[serde(rename = "amiga")]
    Amiga,
    #[serde(rename = "atari")]
    AtariSt,
    #[serde(rename = "acorn")]
    Acorn,
    #[serde(rename = "c64")]
    C64,
    #[serde(rename = "nes")]
    Nes,
    #[serde(rename = "fmtowns")]
    FmTowns,
    #[serde(rename = "segacd")]
    SegaCd,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Platform {
    pub const ALL: [Platform; 11] = [
        Platform::Dos,
        Platform::Windows,
        Platform::Macintosh,
        Platform::Amiga,
        Platform::AtariSt,
        Platform::Acorn,
        Platform::C64,
        Platform::Nes,
        Platform::FmTowns,
        Platform::SegaCd,
        Platform::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Platform::Dos => "pc",
            Platform::Windows => "windows",
            Platform::Macintosh => "macintosh",
            Platform::Amiga => "amiga",
            Platform::AtariSt => "atari",
            Platform::Acorn => "acorn",
            Platform::C64 => "c64",
            Platform::Nes => "nes",
            Platform::FmTowns => "fmtowns",
            Platform::SegaCd => "segacd",
            Platform::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Platform::Unknown
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Platform {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        // Accept a few long-standing aliases alongside the canonical codes.
        let alias = match lower.as_str() {
            "dos" | "ibm" => Some(Platform::Dos),
            "win" => Some(Platform::Windows),
            "mac" => Some(Platform::Macintosh),
            "atarist" => Some(Platform::AtariSt),
            "towns" => Some(Platform::FmTowns),
            "sega" => Some(Platform::SegaCd),
            _ => None,
        };
        alias
            .or_else(|| Platform::ALL.iter().copied().find(|p| p.code() == lower))
            .ok_or_else(|| ResolverError::InvalidInput(format!("unknown platform '{}'", s)))
    }
}

/// Language of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "en")]
    EnAny,
    #[serde(rename = "us")]
    EnUsa,
    #[serde(rename = "gb")]
    EnGrb,
    #[serde(rename = "de")]
    DeDeu,
    #[serde(rename = "fr")]
    FrFra,
    #[serde(rename = "it")]
    ItIta,
    #[serde(rename = "es")]
    EsEsp,
    #[serde(rename = "nl")]
    NlNld,
    #[serde(rename = "se")]
    SeSwe,
    #[serde(rename = "pl")]
    PlPol,
    #[serde(rename = "cz")]
    CsCze,
    #[serde(rename = "ru")]
    RuRus,
    #[serde(rename = "he")]
    HeIsr,
    #[serde(rename = "jp")]
    JaJpn,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Language {
    pub const ALL: [Language; 15] = [
        Language::EnAny,
        Language::EnUsa,
        Language::EnGrb,
        Language::DeDeu,
        Language::FrFra,
        Language::ItIta,
        Language::EsEsp,
        Language::NlNld,
        Language::SeSwe,
        Language::PlPol,
        Language::CsCze,
        Language::RuRus,
        Language::HeIsr,
        Language::JaJpn,
        Language::Unknown,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::EnAny => "en",
            Language::EnUsa => "us",
            Language::EnGrb => "gb",
            Language::DeDeu => "de",
            Language::FrFra => "fr",
            Language::ItIta => "it",
            Language::EsEsp => "es",
            Language::NlNld => "nl",
            Language::SeSwe => "se",
            Language::PlPol => "pl",
            Language::CsCze => "cz",
            Language::RuRus => "ru",
            Language::HeIsr => "he",
            Language::JaJpn => "jp",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        self != Language::Unknown
    }

    /// English of any region.
    pub fn is_english(self) -> bool {
        matches!(self, Language::EnAny | Language::EnUsa | Language::EnGrb)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.code() == lower)
            .ok_or_else(|| ResolverError::InvalidInput(format!("unknown language '{}'", s)))
    }
}
