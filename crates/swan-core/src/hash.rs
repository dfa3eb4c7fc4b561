//! Content hashing for secondary identifiers
//!
//! Hashing is a pure operation and does not go through the effect system.
//! SHA-256 is the single algorithm used; both operators that want to match a
//! secondary identifier must agree on it, so it is not configurable.

use sha2::{Digest, Sha256};

/// Domain-separation prefix for secondary identifier input.
pub const SECONDARY_ID_CONTEXT: &[u8] = b"swan-sid-v1";

/// SHA-256 of `data`.
#[inline]
pub fn hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Unambiguous concatenation of `parts`.
///
/// Each part is preceded by its length as a big-endian `u32`, so
/// `["ab", "c"]` and `["a", "bc"]` never collide.
pub fn canonical_concat(parts: &[&[u8]]) -> Vec<u8> {
    let total: usize = parts.iter().map(|p| 4 + p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(&(part.len() as u32).to_be_bytes());
        out.extend_from_slice(part);
    }
    out
}

/// SHA-256 over the canonical concatenation of `parts`.
pub fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    hash(&canonical_concat(parts))
}
