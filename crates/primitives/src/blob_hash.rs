//! Indexed blob hashes and the KZG versioned hash binding.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

/// The version tag prefixed to the hash of a KZG commitment in a blob
/// transaction's hash list.
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

/// A blob hash, indexed by its position within the enclosing transaction's
/// hash list.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexedBlobHash {
    /// The index of the blob
    pub index: u64,
    /// The hash of the blob
    pub hash: B256,
}

impl PartialEq for IndexedBlobHash {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.hash == other.hash
    }
}

/// Computes the versioned hash of a KZG commitment: the SHA-256 of the
/// commitment with its first byte replaced by [VERSIONED_HASH_VERSION_KZG].
pub fn kzg_to_versioned_hash(commitment: &[u8]) -> B256 {
    let mut hash: [u8; 32] = Sha256::digest(commitment).into();
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    hash.into()
}
