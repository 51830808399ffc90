//! Detection filename synthesis.
//!
//! Every packaging strategy is one [`GenerationRule`] variant; this module is
//! the single place that turns `(rule, pattern, platform)` into the concrete
//! names to probe.

use serde::{Deserialize, Serialize};

use crate::core::{GenerationRule, Platform};

/// A release whose index file is stored inside its host executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedExecutable {
    /// Game id the entry belongs to.
    pub title: String,
    pub platform: Platform,
    /// Filename pattern of the loose data files the executable replaces.
    pub pattern: String,
    /// Logical name of the embedded detection file.
    pub index_file: String,
    pub executable: String,
    pub offset: u64,
    pub length: u64,
}

/// Where a probe's content lives inside the probed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSlice {
    pub index_file: String,
    pub offset: u64,
    pub length: u64,
}

/// One concrete filename to look up in the evidence map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub name: String,
    pub packed: Option<PackedSlice>,
}

impl Probe {
    fn loose(name: String) -> Self {
        Self { name, packed: None }
    }

    /// Name the content is known by: the embedded index file for packed
    /// probes, the probed filename otherwise.
    pub fn logical_name(&self) -> &str {
        self.packed
            .as_ref()
            .map(|p| p.index_file.as_str())
            .unwrap_or(&self.name)
    }
}

/// Turns generation rules into probes, consulting the packed-executable table.
#[derive(Debug, Clone, Copy)]
pub struct PatternGenerator<'a> {
    packed: &'a [PackedExecutable],
}

impl<'a> PatternGenerator<'a> {
    pub fn new(packed: &'a [PackedExecutable]) -> Self {
        Self { packed }
    }

    /// Candidate spellings in probe order.
    pub fn generate(&self, rule: &GenerationRule, pattern: &str, platform: Platform) -> Vec<Probe> {
        match rule {
            GenerationRule::Literal => vec![Probe::loose(pattern.to_string())],
            GenerationRule::DiskNumber | GenerationRule::RoomNumber => {
                vec![Probe::loose(substitute_index(pattern, 0))]
            }
            GenerationRule::HumongousPc => vec![Probe::loose(format!("{}.he0", pattern))],
            GenerationRule::HumongousMac => vec![Probe::loose(format!("{} (0)", pattern))],
            GenerationRule::HumongousMacNoParens => vec![Probe::loose(format!("{} 0", pattern))],
            GenerationRule::ResourceFork => vec![
                Probe::loose(pattern.to_string()),
                Probe::loose(format!("{}.bin", pattern)),
            ],
            GenerationRule::PackedExecutable { title } => self
                .packed
                .iter()
                .filter(|e| e.title.eq_ignore_ascii_case(title))
                .filter(|e| !platform.is_known() || e.platform == platform)
                .map(|e| Probe {
                    name: e.executable.clone(),
                    packed: Some(PackedSlice {
                        index_file: e.index_file.clone(),
                        offset: e.offset,
                        length: e.length,
                    }),
                })
                .collect(),
        }
    }
}

/// Widest number slot a pattern may ask for.
pub const MAX_SLOT_WIDTH: usize = 9;

/// A printf-style integer slot inside a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberSlot {
    start: usize,
    end: usize,
    zero_pad: bool,
    /// `None` when the written width does not fit a `usize`.
    pub width: Option<usize>,
}

/// First `%d`, `%Nd` or `%0Nd` slot of `pattern`.
pub fn find_slot(pattern: &str) -> Option<NumberSlot> {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let mut j = i + 1;
            let zero_pad = bytes.get(j) == Some(&b'0');
            if zero_pad {
                j += 1;
            }
            let width_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if bytes.get(j) == Some(&b'd') {
                let digits = &pattern[width_start..j];
                let width = if digits.is_empty() {
                    Some(0)
                } else {
                    digits.parse().ok()
                };
                return Some(NumberSlot {
                    start: i,
                    end: j + 1,
                    zero_pad,
                    width,
                });
            }
        }
        i += 1;
    }
    None
}

/// Replaces the first printf-style integer slot (`%d`, `%02d`, `%03d`) with
/// `index`, zero-padded to the slot width (at most [`MAX_SLOT_WIDTH`]).
/// Patterns without a slot are returned unchanged.
pub fn substitute_index(pattern: &str, index: u32) -> String {
    let Some(slot) = find_slot(pattern) else {
        return pattern.to_string();
    };
    let width = slot.width.unwrap_or(MAX_SLOT_WIDTH).min(MAX_SLOT_WIDTH);
    let number = if slot.zero_pad {
        format!("{:0width$}", index, width = width)
    } else {
        format!("{:width$}", index, width = width)
    };
    format!("{}{}{}", &pattern[..slot.start], number, &pattern[slot.end..])
}
