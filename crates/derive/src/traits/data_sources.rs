//! Traits describing the data availability seam consumed by the derivation
//! pipeline.

use crate::errors::PipelineResult;
use alloc::{boxed::Box, fmt::Debug};
use alloy_primitives::Bytes;
use async_trait::async_trait;
use reef_primitives::BlockInfo;

/// Describes the functionality of a data source that can provide data
/// availability information for a parent chain block.
#[async_trait]
pub trait DataAvailabilityProvider {
    /// The item type of the data iterator.
    type Item: Send + Sync + Debug + Into<Bytes>;
    /// An iterator over returned bytes data.
    type DataIter: AsyncIterator<Item = Self::Item> + Send + Debug;

    /// Returns the data availability iterator for the block with the given
    /// reference.
    async fn open_data(&self, block_ref: &BlockInfo) -> PipelineResult<Self::DataIter>;
}

/// A simple asynchronous iterator trait.
#[async_trait]
pub trait AsyncIterator {
    /// The item type of the iterator.
    type Item: Send + Sync + Debug + Into<Bytes>;

    /// Returns the next item in the iterator, or [PipelineError::Eof] once
    /// the source is exhausted.
    ///
    /// [PipelineError::Eof]: crate::errors::PipelineError::Eof
    async fn next(&mut self) -> PipelineResult<Self::Item>;
}
