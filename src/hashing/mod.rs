//! Content digests over bounded byte prefixes.

/// Computes the MD5 digest of at most `cap` leading bytes of `data`.
pub fn md5_prefix(data: &[u8], cap: u64) -> [u8; 16] {
    let end = data.len().min(usize::try_from(cap).unwrap_or(usize::MAX));
    md5::compute(&data[..end]).0
}
