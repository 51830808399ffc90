//! Content fingerprints and the byte caps they are computed under.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolverError;
use crate::hashing::md5_prefix;

/// A 128-bit content digest, rendered as 32 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Digest of at most `cap` leading bytes of `data`.
    pub fn of_prefix(data: &[u8], cap: FingerprintCap) -> Self {
        Self(md5_prefix(data, cap.bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 32-digit hex literal in a `const` context, so a malformed
    /// table entry fails the build instead of a scan.
    pub const fn from_hex_literal(literal: &str) -> Self {
        let digits = literal.as_bytes();
        assert!(digits.len() == 32, "fingerprint literal must be 32 hex digits");
        let mut bytes = [0u8; 16];
        let mut i = 0;
        while i < 16 {
            bytes[i] = (nibble(digits[2 * i]) << 4) | nibble(digits[2 * i + 1]);
            i += 1;
        }
        Self(bytes)
    }
}

const fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => panic!("fingerprint literal contains a non-hex digit"),
    }
}

impl FromStr for Fingerprint {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| ResolverError::InvalidFingerprint(format!("{}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Number of leading content bytes a fingerprint covers.
///
/// Different signature families were catalogued with different caps, so the
/// cap travels with each file requirement rather than being global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintCap(u64);

impl FingerprintCap {
    /// First megabyte; used by the whole-file room/disk catalogue.
    pub const WHOLE_FILE_MIB: FingerprintCap = FingerprintCap(1024 * 1024);
    /// First 5000 bytes; used by the prefix catalogue.
    pub const PREFIX_5000: FingerprintCap = FingerprintCap(5000);

    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl Default for FingerprintCap {
    fn default() -> Self {
        FingerprintCap::WHOLE_FILE_MIB
    }
}
