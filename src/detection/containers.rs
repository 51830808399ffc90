//! Container unwrapping.
//!
//! Recovers the logically identified bytes from an outer wrapper: Macintosh
//! resource-fork dumps (MacBinary, AppleSingle), Commodore 1541 disk images
//! and index files packed into a host executable. Every parser works on the
//! bounded prefix already read for fingerprinting and never panics on
//! truncated or hostile input; anything that does not parse is a no-op.

use memchr::memchr;
use std::sync::Arc;
use tracing::{debug, trace};

use super::evidence::{FileEvidence, UnwrappedContent};
use crate::core::{ContainerHint, ContainerKind};

const MACBINARY_HEADER: usize = 128;
const MACBINARY_MAX_NAME: u8 = 63;

const APPLESINGLE_MAGIC: u32 = 0x0005_1600;
const APPLESINGLE_DATA_FORK: u32 = 1;

const D64_SECTOR: usize = 256;
const D64_DIR_TRACK: u8 = 18;
const D64_DIR_SECTOR: u8 = 1;
const D64_NAME_PAD: u8 = 0xA0;
/// 35 and 40 track images, each with and without the error table.
pub const D64_IMAGE_SIZES: [u64; 4] = [174_848, 175_531, 196_608, 197_376];
pub const D64_MAX_IMAGE_SIZE: u64 = 197_376;

/// One way of recovering inner content from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerTransform {
    MacBinary,
    AppleSingle,
    DiskImage { inner_name: String },
    PackedSlice { index_file: String, offset: u64, length: u64 },
}

impl ContainerTransform {
    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerTransform::MacBinary => ContainerKind::MacBinary,
            ContainerTransform::AppleSingle => ContainerKind::AppleSingle,
            ContainerTransform::DiskImage { .. } => ContainerKind::DiskImage,
            ContainerTransform::PackedSlice { .. } => ContainerKind::PackedExecutable,
        }
    }

    /// `raw` is a prefix of a file whose full length is `raw_size`.
    pub fn unwrap(&self, raw: &[u8], raw_size: u64) -> Option<UnwrappedContent> {
        match self {
            ContainerTransform::MacBinary => unwrap_macbinary(raw, raw_size),
            ContainerTransform::AppleSingle => unwrap_applesingle(raw),
            ContainerTransform::DiskImage { inner_name } => {
                if !D64_IMAGE_SIZES.contains(&raw_size) {
                    return None;
                }
                let data = d64_extract(raw, inner_name)?;
                let logical_size = data.len() as u64;
                Some(UnwrappedContent {
                    kind: ContainerKind::DiskImage,
                    inner: Some(inner_name.clone()),
                    data: Arc::from(data),
                    logical_size,
                })
            }
            ContainerTransform::PackedSlice { index_file, offset, length } => {
                let end = offset.checked_add(*length)?;
                if end > raw_size {
                    return None;
                }
                let start = usize::try_from(*offset).ok()?;
                let end = usize::try_from(end).ok()?;
                let data = raw.get(start..end)?;
                Some(UnwrappedContent {
                    kind: ContainerKind::PackedExecutable,
                    inner: Some(index_file.clone()),
                    data: Arc::from(data),
                    logical_size: *length,
                })
            }
        }
    }
}

/// Applies the transforms a requirement's container hint allows.
pub struct ContainerUnwrapper;

impl ContainerUnwrapper {
    /// Transforms worth trying for `hint`, in order.
    pub fn transforms_for(hint: &ContainerHint) -> Vec<ContainerTransform> {
        match hint {
            ContainerHint::Auto | ContainerHint::ResourceFork => {
                vec![ContainerTransform::MacBinary, ContainerTransform::AppleSingle]
            }
            ContainerHint::DiskImage { inner_name, .. } => vec![ContainerTransform::DiskImage {
                inner_name: inner_name.clone(),
            }],
        }
    }

    /// First transform that applies to the evidence, or `None`. Read failures
    /// also yield `None`; the caller has already reported them.
    pub fn try_unwrap(evidence: &FileEvidence, hint: &ContainerHint) -> Option<UnwrappedContent> {
        if let Some(existing) = evidence.unwrapped() {
            return Some(existing.clone());
        }
        let raw = evidence.prefix().ok()?;
        for transform in Self::transforms_for(hint) {
            if let Some(content) = transform.unwrap(&raw, evidence.raw_size()) {
                debug!(
                    file = %evidence.display_name(),
                    container = %content.kind,
                    inner_size = content.logical_size,
                    "unwrapped container"
                );
                return Some(content);
            }
        }
        trace!(file = %evidence.display_name(), "no container transform applies");
        None
    }
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn pad_128(n: u64) -> u64 {
    (n + 127) & !127
}

/// Data fork of a MacBinary file. The padded fork sizes plus the header must
/// account for the whole file.
pub fn unwrap_macbinary(raw: &[u8], raw_size: u64) -> Option<UnwrappedContent> {
    if raw.len() < MACBINARY_HEADER {
        return None;
    }
    if raw[0] != 0 || raw[74] != 0 || raw[82] != 0 {
        return None;
    }
    if raw[1] == 0 || raw[1] > MACBINARY_MAX_NAME {
        return None;
    }
    let data_len = u64::from(be_u32(raw, 83)?);
    let rsrc_len = u64::from(be_u32(raw, 87)?);
    if MACBINARY_HEADER as u64 + pad_128(data_len) + pad_128(rsrc_len) != raw_size {
        return None;
    }
    let end = (MACBINARY_HEADER as u64 + data_len).min(raw.len() as u64) as usize;
    Some(UnwrappedContent {
        kind: ContainerKind::MacBinary,
        inner: None,
        data: Arc::from(&raw[MACBINARY_HEADER..end]),
        logical_size: data_len,
    })
}

/// Data fork entry of an AppleSingle file.
pub fn unwrap_applesingle(raw: &[u8]) -> Option<UnwrappedContent> {
    if be_u32(raw, 0)? != APPLESINGLE_MAGIC {
        return None;
    }
    let count = usize::from(be_u16(raw, 24)?);
    for i in 0..count {
        let at = 26 + i * 12;
        let id = be_u32(raw, at)?;
        if id != APPLESINGLE_DATA_FORK {
            continue;
        }
        let offset = be_u32(raw, at + 4)? as usize;
        let length = u64::from(be_u32(raw, at + 8)?);
        if offset > raw.len() {
            return None;
        }
        let end = (offset as u64 + length).min(raw.len() as u64) as usize;
        return Some(UnwrappedContent {
            kind: ContainerKind::AppleSingle,
            inner: None,
            data: Arc::from(&raw[offset..end]),
            logical_size: length,
        });
    }
    None
}

fn d64_sectors_in_track(track: u8) -> usize {
    match track {
        1..=17 => 21,
        18..=24 => 19,
        25..=30 => 18,
        _ => 17,
    }
}

fn d64_sector_offset(track: u8, sector: u8) -> Option<usize> {
    if track == 0 || track > 40 || usize::from(sector) >= d64_sectors_in_track(track) {
        return None;
    }
    let before: usize = (1..track).map(d64_sectors_in_track).sum();
    Some((before + usize::from(sector)) * D64_SECTOR)
}

fn d64_sector(image: &[u8], track: u8, sector: u8) -> Option<&[u8]> {
    let at = d64_sector_offset(track, sector)?;
    image.get(at..at + D64_SECTOR)
}

/// Follows a sector chain, stopping at the first cycle or bad link.
fn d64_read_chain(image: &[u8], mut track: u8, mut sector: u8) -> Option<Vec<u8>> {
    let max_sectors = image.len() / D64_SECTOR;
    let mut out = Vec::new();
    for _ in 0..max_sectors {
        let block = d64_sector(image, track, sector)?;
        let (next_track, next_sector) = (block[0], block[1]);
        if next_track == 0 {
            let last = usize::from(next_sector).clamp(1, D64_SECTOR - 1);
            out.extend_from_slice(&block[2..=last]);
            return Some(out);
        }
        out.extend_from_slice(&block[2..]);
        track = next_track;
        sector = next_sector;
    }
    None
}

/// Name stored in a directory entry, without the 0xA0 padding.
fn d64_entry_name(raw: &[u8]) -> &[u8] {
    match memchr(D64_NAME_PAD, raw) {
        Some(end) => &raw[..end],
        None => raw,
    }
}

/// Contents of the first file named `name` (ASCII case-insensitive) in a
/// 1541 image.
pub fn d64_extract(image: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut track = D64_DIR_TRACK;
    let mut sector = D64_DIR_SECTOR;
    let max_dir_sectors = d64_sectors_in_track(D64_DIR_TRACK);
    for _ in 0..max_dir_sectors {
        let block = d64_sector(image, track, sector)?;
        for entry in block.chunks_exact(32) {
            let file_type = entry[2];
            if file_type == 0 {
                continue;
            }
            if d64_entry_name(&entry[5..21]).eq_ignore_ascii_case(name.as_bytes()) {
                return d64_read_chain(image, entry[3], entry[4]);
            }
        }
        if block[0] == 0 {
            break;
        }
        track = block[0];
        sector = block[1];
    }
    None
}

/// Name of the next image in a multi-disk set: the first digit of `name`
/// incremented (`maniac1.d64` becomes `maniac2.d64`).
pub fn companion_name(name: &str) -> Option<String> {
    let at = name.find(|c: char| c.is_ascii_digit())?;
    let digit = name.as_bytes()[at];
    if digit == b'9' {
        return None;
    }
    let mut out = String::with_capacity(name.len());
    out.push_str(&name[..at]);
    out.push(char::from(digit + 1));
    out.push_str(&name[at + 1..]);
    Some(out)
}
