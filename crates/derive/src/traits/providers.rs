//! Chain provider trait for parent chain data.

use crate::errors::ChainProviderError;
use alloc::{boxed::Box, vec::Vec};
use alloy_consensus::TxEnvelope;
use alloy_primitives::B256;
use async_trait::async_trait;
use reef_primitives::BlockInfo;

/// Describes the functionality of a data source that can fetch parent chain
/// blocks and their transactions.
#[async_trait]
pub trait ChainProvider {
    /// Returns the [BlockInfo] and list of [TxEnvelope]s for the block with
    /// the given hash.
    async fn block_info_and_transactions_by_hash(
        &mut self,
        hash: B256,
    ) -> Result<(BlockInfo, Vec<TxEnvelope>), ChainProviderError>;
}
