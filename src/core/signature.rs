//! Candidate signatures: the static description of one known release.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fingerprint::{Fingerprint, FingerprintCap};
use super::platform::{Language, Platform};

bitflags! {
    /// Release features that matter for identification and naming.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FeatureFlags: u32 {
        const DEMO = 1 << 0;
        /// Speech on CD.
        const TALKIE = 1 << 1;
        /// Old bundle layout (room files with the pre-V3 block format).
        const OLD_BUNDLE = 1 << 2;
        const BIG_ENDIAN_DATA = 1 << 3;
        const SMALL_HEADER = 1 << 4;
        const SIXTEEN_COLOR = 1 << 5;
        const AUDIO_TRACKS = 1 << 6;
        const USE_KEY = 1 << 7;
        const CD = 1 << 8;
        const FAN_TRANSLATION = 1 << 9;
        const UNENCRYPTED = 1 << 10;
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        FeatureFlags::empty()
    }
}

/// What a required file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// The file whose content is authoritative for identification.
    #[default]
    Detection,
    Base,
    Icon,
    Strings,
    Tables,
    Data,
}

/// How the on-disk detection filename is derived from a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRule {
    /// The pattern is the filename.
    #[default]
    Literal,
    /// printf-style disk number slot, probed with disk 0.
    DiskNumber,
    /// printf-style room number slot, probed with room 0.
    RoomNumber,
    /// `<pattern>.he0`
    HumongousPc,
    /// `<pattern> (0)`
    HumongousMac,
    /// `<pattern> 0`
    HumongousMacNoParens,
    /// `<pattern>` as a bare fork or as `<pattern>.bin` from a MacBinary dump.
    ResourceFork,
    /// Data stored inside the host executable registered for `title`.
    PackedExecutable { title: String },
}

impl fmt::Display for GenerationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationRule::Literal => f.write_str("literal"),
            GenerationRule::DiskNumber => f.write_str("disk_number"),
            GenerationRule::RoomNumber => f.write_str("room_number"),
            GenerationRule::HumongousPc => f.write_str("humongous_pc"),
            GenerationRule::HumongousMac => f.write_str("humongous_mac"),
            GenerationRule::HumongousMacNoParens => f.write_str("humongous_mac_no_parens"),
            GenerationRule::ResourceFork => f.write_str("resource_fork"),
            GenerationRule::PackedExecutable { title } => write!(f, "packed_executable({})", title),
        }
    }
}

/// Which wrapper, if any, the requirement's content may be hidden in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContainerHint {
    /// Try the self-identifying wrappers (MacBinary, AppleSingle) on a miss.
    #[default]
    Auto,
    /// The file is expected to be a Macintosh resource-fork dump.
    ResourceFork,
    /// The file is a disk image holding `inner_name`; multi-disk sets also
    /// need the companion image.
    DiskImage {
        inner_name: String,
        #[serde(default)]
        needs_companion: bool,
    },
}

/// One file a release must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequirement {
    /// Literal filename or pattern, depending on `rule`.
    pub name: String,
    #[serde(default)]
    pub rule: GenerationRule,
    #[serde(default)]
    pub role: FileRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    /// Expected size of the effective (unwrapped) content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub cap: FingerprintCap,
    #[serde(default)]
    pub container: ContainerHint,
}

impl FileRequirement {
    pub fn new(name: impl Into<String>, rule: GenerationRule) -> Self {
        Self {
            name: name.into(),
            rule,
            role: FileRole::Detection,
            fingerprint: None,
            size: None,
            cap: FingerprintCap::default(),
            container: ContainerHint::Auto,
        }
    }

    pub fn literal(name: impl Into<String>) -> Self {
        Self::new(name, GenerationRule::Literal)
    }

    pub fn with_role(mut self, role: FileRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn with_cap(mut self, cap: FingerprintCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_container(mut self, container: ContainerHint) -> Self {
        self.container = container;
        self
    }

    pub fn is_fingerprinted(&self) -> bool {
        self.fingerprint.is_some()
    }
}

/// An immutable description of one release: title, variant, platform,
/// language and the files that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSignature {
    pub game_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_tag: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub flags: FeatureFlags,
    /// Engine generation, consulted by version gates during disambiguation.
    #[serde(default)]
    pub engine_version: u8,
    pub required_files: Vec<FileRequirement>,
}

impl CandidateSignature {
    pub fn new(game_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            title: title.into(),
            variant_tag: None,
            platform: Platform::Unknown,
            language: Language::Unknown,
            flags: FeatureFlags::empty(),
            engine_version: 0,
            required_files: Vec::new(),
        }
    }

    pub fn with_variant(mut self, tag: impl Into<String>) -> Self {
        self.variant_tag = Some(tag.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_engine_version(mut self, version: u8) -> Self {
        self.engine_version = version;
        self
    }

    pub fn with_file(mut self, requirement: FileRequirement) -> Self {
        self.required_files.push(requirement);
        self
    }

    /// Index of the detection file: the first `Detection` role, else the
    /// first requirement.
    pub fn primary_index(&self) -> usize {
        self.required_files
            .iter()
            .position(|r| r.role == FileRole::Detection)
            .unwrap_or(0)
    }

    pub fn primary_requirement(&self) -> Option<&FileRequirement> {
        self.required_files.get(self.primary_index())
    }

    pub fn has_fingerprints(&self) -> bool {
        self.required_files.iter().any(FileRequirement::is_fingerprinted)
    }

    pub fn is_demo(&self) -> bool {
        self.flags.contains(FeatureFlags::DEMO)
    }
}
