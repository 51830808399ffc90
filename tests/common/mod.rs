//! Common test utilities and helpers.
//!
//! Fixture databases are built from synthetic bytes so that every fingerprint
//! is known to the test.

use assetid::catalog::{CatalogData, SignatureDatabase};
use assetid::core::{
    CandidateSignature, FileRequirement, Fingerprint, FingerprintCap, Language, Platform,
};
use std::fs;
use std::path::Path;

/// Digest of `data` the way the prefix-digest family records it.
pub fn fp(data: &[u8]) -> Fingerprint {
    Fingerprint::of_prefix(data, FingerprintCap::PREFIX_5000)
}

/// Deterministic filler bytes, distinct per `seed`.
pub fn content(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

/// A release identified by the prefix digest of every listed file.
pub fn release(
    game_id: &str,
    language: Language,
    platform: Platform,
    files: &[(&str, &[u8])],
) -> CandidateSignature {
    let mut sig = CandidateSignature::new(game_id, game_id)
        .with_language(language)
        .with_platform(platform);
    for (name, data) in files {
        sig = sig.with_file(
            FileRequirement::literal(*name)
                .with_fingerprint(fp(data))
                .with_cap(FingerprintCap::PREFIX_5000),
        );
    }
    sig
}

pub fn database(signatures: Vec<CandidateSignature>) -> SignatureDatabase {
    SignatureDatabase::from_catalog(CatalogData {
        signatures,
        ..CatalogData::default()
    })
    .unwrap()
}

/// Writes `files` below `dir`, creating parent directories.
pub fn write_files(dir: &Path, files: &[(&str, &[u8])]) {
    for (name, data) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }
}

fn pad_128(n: usize) -> usize {
    (n + 127) & !127
}

/// `data` as the data fork of a MacBinary dump with a dummy resource fork.
pub fn macbinary(name: &str, data: &[u8], rsrc_len: usize) -> Vec<u8> {
    let mut out = vec![0u8; 128];
    out[1] = name.len() as u8;
    out[2..2 + name.len()].copy_from_slice(name.as_bytes());
    out[83..87].copy_from_slice(&(data.len() as u32).to_be_bytes());
    out[87..91].copy_from_slice(&(rsrc_len as u32).to_be_bytes());
    out.extend_from_slice(data);
    out.resize(128 + pad_128(data.len()), 0);
    out.resize(out.len() + pad_128(rsrc_len), 0xEE);
    out
}

/// A 35-track 1541 image holding one file of at most 508 bytes.
pub fn d64_with_file(name: &str, data: &[u8]) -> Vec<u8> {
    assert!(data.len() <= 508 && name.len() <= 16);
    let mut image = vec![0u8; 174_848];
    // Track 18 sector 1 follows the 17 tracks of 21 sectors.
    let dir = (17 * 21 + 1) * 256;
    image[dir] = 0;
    image[dir + 1] = 0xFF;
    image[dir + 2] = 0x82;
    image[dir + 3] = 1;
    image[dir + 4] = 0;
    let mut padded = [0xA0u8; 16];
    padded[..name.len()].copy_from_slice(name.as_bytes());
    image[dir + 5..dir + 21].copy_from_slice(&padded);

    let (head, tail) = data.split_at(254.min(data.len()));
    image[0] = 1;
    image[1] = 1;
    image[2..2 + head.len()].copy_from_slice(head);
    image[256] = 0;
    image[257] = (tail.len() + 1) as u8;
    image[258..258 + tail.len()].copy_from_slice(tail);
    image
}
