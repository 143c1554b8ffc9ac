//! Blob provider trait and the in memory reference implementation.

use crate::errors::BlobProviderError;
use alloc::{boxed::Box, vec::Vec};
use alloy_primitives::B256;
use async_trait::async_trait;
use reef_primitives::{Blob, BlockInfo, IndexedBlobHash};

/// The [BlobProvider] trait specifies the functionality of a data source
/// that can fetch blobs for a block reference.
#[async_trait]
pub trait BlobProvider {
    /// Fetches the blobs for the given block reference, in the exact order
    /// of the supplied indexed hashes.
    async fn get_blobs(
        &mut self,
        block_ref: &BlockInfo,
        blob_hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Blob>, BlobProviderError>;
}

/// A [BlobProvider] backed by an in memory store, for offline use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobProvider {
    /// Maps block hashes to the blobs they carry, using a tuple list.
    blocks_to_blobs: Vec<(B256, Vec<(IndexedBlobHash, Blob)>)>,
}

impl InMemoryBlobProvider {
    /// Creates a new [InMemoryBlobProvider].
    pub const fn new() -> Self {
        Self { blocks_to_blobs: Vec::new() }
    }

    /// Inserts blobs for a block hash.
    pub fn insert_blobs(&mut self, block_hash: B256, blobs: Vec<(IndexedBlobHash, Blob)>) {
        if let Some((_, existing)) =
            self.blocks_to_blobs.iter_mut().find(|(hash, _)| *hash == block_hash)
        {
            existing.extend(blobs);
        } else {
            self.blocks_to_blobs.push((block_hash, blobs));
        }
    }
}

#[async_trait]
impl BlobProvider for InMemoryBlobProvider {
    async fn get_blobs(
        &mut self,
        block_ref: &BlockInfo,
        blob_hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Blob>, BlobProviderError> {
        let blobs = self
            .blocks_to_blobs
            .iter()
            .find(|(hash, _)| *hash == block_ref.hash)
            .map(|(_, blobs)| blobs)
            .ok_or(BlobProviderError::BlobsNotFound)?;

        let mut fetched = Vec::with_capacity(blob_hashes.len());
        for requested in blob_hashes {
            let blob = blobs
                .iter()
                .find(|(indexed, _)| indexed == requested)
                .map(|(_, blob)| *blob)
                .ok_or(BlobProviderError::BlobsNotFound)?;
            fetched.push(blob);
        }
        Ok(fetched)
    }
}
