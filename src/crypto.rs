//! Hashing primitives for AeroChain

use sha2::{Digest, Sha256};

/// A pluggable digest over the canonical encoding of a block.
///
/// Implementations must be deterministic and avalanche-sensitive, and must
/// never return the genesis sentinel `"0"`.
pub trait HashFunction: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Digest `bytes` into the string form stored in `Block::hash`.
    fn hash(&self, bytes: &[u8]) -> String;
}

/// SHA-256, hex encoded. The default hash function for new ledgers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl HashFunction for Sha256Hasher {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn hash(&self, bytes: &[u8]) -> String {
        sha256_hex(bytes)
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
