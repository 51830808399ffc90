//! Canonical target names and the title table behind them.

use serde::{Deserialize, Serialize};

use crate::core::{Language, MatchResult, Platform, ResolvedTarget};

/// A known title and the platform/language most of its releases share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleEntry {
    pub game_id: String,
    pub title: String,
    #[serde(default = "default_platform")]
    pub default_platform: Platform,
    #[serde(default = "default_language")]
    pub default_language: Language,
}

fn default_platform() -> Platform {
    Platform::Dos
}

fn default_language() -> Language {
    Language::EnAny
}

impl TitleEntry {
    pub fn new(game_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            title: title.into(),
            default_platform: default_platform(),
            default_language: default_language(),
        }
    }

    pub fn on(mut self, platform: Platform) -> Self {
        self.default_platform = platform;
        self
    }

    pub fn in_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }
}

/// A retired game id and what it maps to today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsoleteId {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl ObsoleteId {
    /// Rewrites a target saved under the retired id. Returns whether it did.
    pub fn upgrade(&self, target: &mut ResolvedTarget) -> bool {
        if !target.game_id.eq_ignore_ascii_case(&self.from) {
            return false;
        }
        target.game_id = self.to.clone();
        if let Some(platform) = self.platform {
            if !target.platform.is_known() {
                target.platform = platform;
            }
        }
        true
    }
}

/// Turns a match into a stable, human-readable target id.
#[derive(Debug, Clone, Copy)]
pub struct TargetNamer<'a> {
    titles: &'a [TitleEntry],
}

impl<'a> TargetNamer<'a> {
    pub fn new(titles: &'a [TitleEntry]) -> Self {
        Self { titles }
    }

    fn defaults(&self, game_id: &str) -> (Platform, Language) {
        self.titles
            .iter()
            .find(|t| t.game_id.eq_ignore_ascii_case(game_id))
            .map(|t| (t.default_platform, t.default_language))
            .unwrap_or((default_platform(), default_language()))
    }

    /// `gameid[-variant][-demo][-platform][-language]`, suffixes only where
    /// they say something the title's defaults do not.
    pub fn name(&self, result: &MatchResult) -> String {
        let sig = &result.signature;
        let (default_platform, default_language) = self.defaults(&sig.game_id);
        let mut name = sig.game_id.to_lowercase();

        let variant = sig.variant_tag.as_deref().map(slug).unwrap_or_default();
        if !variant.is_empty() {
            name.push('-');
            name.push_str(&variant);
        }
        if sig.is_demo() && !variant.contains("demo") {
            name.push_str("-demo");
        }

        let platform = result.resolved_platform;
        if platform.is_known() && platform != default_platform && !names_platform(&variant, platform) {
            name.push('-');
            name.push_str(platform.code());
        }

        let language = result.resolved_language;
        let english_default = language.is_english() && default_language == Language::EnAny;
        if language.is_known() && language != default_language && !english_default {
            name.push('-');
            name.push_str(language.code());
        }
        name
    }
}

/// Whether a variant slug such as `fm-towns` or `sega` already says the
/// platform.
fn names_platform(variant: &str, platform: Platform) -> bool {
    let compact: String = variant.chars().filter(|c| *c != '-').collect();
    let code = platform.code();
    !compact.is_empty() && (code.starts_with(&compact) || compact.starts_with(code))
}

/// Lowercase, with every run of non-alphanumerics collapsed to one `-`.
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
