//! Contains the per block factory for the blob data source.

use crate::{
    errors::PipelineResult,
    sources::BlobSource,
    traits::{BlobProvider, ChainProvider, DataAvailabilityProvider},
};
use alloc::{boxed::Box, fmt::Debug};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use reef_primitives::BlockInfo;

/// A factory that opens a [BlobSource] for each parent chain block the
/// derivation pipeline traverses.
#[derive(Debug, Clone, Copy)]
pub struct EthereumDataSource<C, B>
where
    C: ChainProvider + Send + Clone,
    B: BlobProvider + Send + Clone,
{
    /// The chain provider to use for the factory.
    pub chain_provider: C,
    /// The blob provider.
    pub blob_provider: B,
    /// The batch inbox address.
    pub batch_inbox_address: Address,
    /// The batcher address.
    pub batcher_address: Address,
}

impl<C, B> EthereumDataSource<C, B>
where
    C: ChainProvider + Send + Clone,
    B: BlobProvider + Send + Clone,
{
    /// Creates a new factory.
    pub const fn new(
        chain_provider: C,
        blob_provider: B,
        batch_inbox_address: Address,
        batcher_address: Address,
    ) -> Self {
        Self { chain_provider, blob_provider, batch_inbox_address, batcher_address }
    }
}

#[async_trait]
impl<C, B> DataAvailabilityProvider for EthereumDataSource<C, B>
where
    C: ChainProvider + Send + Sync + Clone + Debug,
    B: BlobProvider + Send + Sync + Clone + Debug,
{
    type Item = Bytes;
    type DataIter = BlobSource<C, B>;

    async fn open_data(&self, block_ref: &BlockInfo) -> PipelineResult<Self::DataIter> {
        Ok(BlobSource::new(
            self.chain_provider.clone(),
            self.blob_provider.clone(),
            self.batch_inbox_address,
            self.batcher_address,
            *block_ref,
        ))
    }
}
