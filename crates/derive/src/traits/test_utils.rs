//! Test utilities for the provider traits.

use crate::{
    errors::{BlobProviderError, ChainProviderError},
    traits::{BlobProvider, ChainProvider, InMemoryBlobProvider},
};
use alloc::{boxed::Box, vec::Vec};
use alloy_consensus::TxEnvelope;
use alloy_primitives::B256;
use async_trait::async_trait;
use reef_primitives::{Blob, BlockInfo, IndexedBlobHash};

/// A mock chain provider for testing.
#[derive(Debug, Clone, Default)]
pub struct TestChainProvider {
    /// Maps block hashes to block info and transactions using a tuple list.
    pub blocks: Vec<(B256, BlockInfo, Vec<TxEnvelope>)>,
    /// An error to return on the next call, instead of the stored blocks.
    pub error: Option<ChainProviderError>,
}

impl TestChainProvider {
    /// Insert a block with transactions into the mock chain provider.
    pub fn insert_block_with_transactions(&mut self, block: BlockInfo, txs: Vec<TxEnvelope>) {
        self.blocks.push((block.hash, block, txs));
    }

    /// Clears all blocks from the mock chain provider.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

#[async_trait]
impl ChainProvider for TestChainProvider {
    async fn block_info_and_transactions_by_hash(
        &mut self,
        hash: B256,
    ) -> Result<(BlockInfo, Vec<TxEnvelope>), ChainProviderError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.blocks
            .iter()
            .find(|(block_hash, _, _)| *block_hash == hash)
            .map(|(_, info, txs)| (*info, txs.clone()))
            .ok_or(ChainProviderError::BlockNotFound(hash))
    }
}

/// A mock blob provider for testing.
#[derive(Debug, Clone, Default)]
pub struct TestBlobProvider {
    /// The inner in memory store.
    pub inner: InMemoryBlobProvider,
    /// An error to return on the next call, instead of the stored blobs.
    pub error: Option<BlobProviderError>,
}

impl TestBlobProvider {
    /// Inserts blobs for a block hash.
    pub fn insert_blobs(&mut self, block_hash: B256, blobs: Vec<(IndexedBlobHash, Blob)>) {
        self.inner.insert_blobs(block_hash, blobs);
    }
}

#[async_trait]
impl BlobProvider for TestBlobProvider {
    async fn get_blobs(
        &mut self,
        block_ref: &BlockInfo,
        blob_hashes: &[IndexedBlobHash],
    ) -> Result<Vec<Blob>, BlobProviderError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.inner.get_blobs(block_ref, blob_hashes).await
    }
}
