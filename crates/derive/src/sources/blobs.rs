//! Blob Data Source

use crate::{
    errors::{BlobProviderError, PipelineError, PipelineErrorKind, PipelineResult},
    sources::BlobData,
    traits::{AsyncIterator, BlobProvider, ChainProvider, SignedRecoverable},
};
use alloc::{boxed::Box, vec::Vec};
use alloy_consensus::{TxEip4844Variant, TxEnvelope};
use alloy_primitives::{Address, Bytes, TxKind};
use async_trait::async_trait;
use reef_primitives::{BlockInfo, IndexedBlobHash};
use tracing::warn;

/// A data iterator that yields the batcher's blob and calldata payloads for
/// a single parent chain block.
#[derive(Debug, Clone)]
pub struct BlobSource<C, B>
where
    C: ChainProvider + Send,
    B: BlobProvider + Send,
{
    /// Fetches blocks.
    pub chain_provider: C,
    /// Fetches blobs.
    pub blob_fetcher: B,
    /// The address of the batch inbox the batcher posts to.
    pub batch_inbox_address: Address,
    /// The address batcher transactions must be signed by.
    pub batcher_address: Address,
    /// Block ref to load the batcher transactions from.
    pub block_ref: BlockInfo,
    /// The data entries for the block, in transaction and blob index order.
    pub data: Vec<BlobData>,
    /// Whether the source has loaded its block.
    pub open: bool,
}

impl<C, B> BlobSource<C, B>
where
    C: ChainProvider + Send,
    B: BlobProvider + Send,
{
    /// Creates a new blob source for the given block reference.
    pub const fn new(
        chain_provider: C,
        blob_fetcher: B,
        batch_inbox_address: Address,
        batcher_address: Address,
        block_ref: BlockInfo,
    ) -> Self {
        Self {
            chain_provider,
            blob_fetcher,
            batch_inbox_address,
            batcher_address,
            block_ref,
            data: Vec::new(),
            open: false,
        }
    }

    /// Extracts the batcher's data entries and indexed blob hashes from the
    /// block's transactions, in transaction and then blob index order.
    /// Transactions that fail the inbox or sender filter still advance the
    /// blob index counter so indices stay correct within the block.
    fn extract_blob_data(&self, txs: Vec<TxEnvelope>) -> (Vec<BlobData>, Vec<IndexedBlobHash>) {
        let mut index = 0;
        let mut data = Vec::new();
        let mut hashes = Vec::new();
        for tx in txs {
            let (tx_kind, calldata, blob_hashes) = match &tx {
                TxEnvelope::Legacy(tx) => (tx.tx().to, tx.tx().input.clone(), None),
                TxEnvelope::Eip2930(tx) => (tx.tx().to, tx.tx().input.clone(), None),
                TxEnvelope::Eip1559(tx) => (tx.tx().to, tx.tx().input.clone(), None),
                TxEnvelope::Eip4844(tx) => match tx.tx() {
                    TxEip4844Variant::TxEip4844(tx) => (
                        TxKind::Call(tx.to),
                        tx.input.clone(),
                        Some(tx.blob_versioned_hashes.clone()),
                    ),
                    TxEip4844Variant::TxEip4844WithSidecar(tx) => {
                        let tx = tx.tx();
                        (
                            TxKind::Call(tx.to),
                            tx.input.clone(),
                            Some(tx.blob_versioned_hashes.clone()),
                        )
                    }
                },
                _ => continue,
            };
            let blob_count = blob_hashes.as_ref().map_or(0, Vec::len) as u64;

            let TxKind::Call(to) = tx_kind else {
                index += blob_count;
                continue;
            };
            if to != self.batch_inbox_address {
                index += blob_count;
                continue;
            }
            if tx.recover_public_key().map_or(true, |sender| sender != self.batcher_address) {
                index += blob_count;
                continue;
            }

            let Some(blob_hashes) = blob_hashes else {
                // A plain batcher transaction carries its payload as
                // calldata.
                data.push(BlobData { data: None, calldata: Some(calldata) });
                continue;
            };
            if !calldata.is_empty() {
                // Calldata on a blob transaction is reserved for a separate
                // data source and is not derived from here.
                warn!(
                    target: "blob-source",
                    "Blob transaction has calldata, which will be ignored"
                );
            }
            for hash in blob_hashes {
                hashes.push(IndexedBlobHash { index, hash });
                data.push(BlobData::default());
                index += 1;
            }
        }
        (data, hashes)
    }

    /// Loads the block's data entries if the source is not yet open. The
    /// open flag and the cached entries are the only state carried across
    /// calls, so a failed load is retried from scratch.
    async fn load_blobs(&mut self) -> Result<(), PipelineErrorKind> {
        if self.open {
            return Ok(());
        }

        let (_, txs) =
            self.chain_provider.block_info_and_transactions_by_hash(self.block_ref.hash).await?;

        let (mut data, blob_hashes) = self.extract_blob_data(txs);

        if !blob_hashes.is_empty() {
            let blobs =
                self.blob_fetcher.get_blobs(&self.block_ref, &blob_hashes).await.map_err(|e| {
                    warn!(target: "blob-source", "Failed to fetch blobs: {e}");
                    PipelineErrorKind::from(e)
                })?;
            if blobs.len() != blob_hashes.len() {
                return Err(BlobProviderError::SidecarLengthMismatch(
                    blob_hashes.len(),
                    blobs.len(),
                )
                .into());
            }

            // Fill the blob entries with the fetched bodies.
            let mut blob_index = 0;
            for entry in data.iter_mut() {
                if entry.fill(&blobs, blob_index).map_err(PipelineErrorKind::from)? {
                    blob_index += 1;
                }
            }
        }

        self.open = true;
        self.data = data;
        Ok(())
    }

    /// Pops the next data entry, or the pipeline signal to return.
    fn next_data(&mut self) -> Result<BlobData, PipelineResult<Bytes>> {
        if self.data.is_empty() {
            return Err(Err(PipelineError::Eof.temp()));
        }
        Ok(self.data.remove(0))
    }
}

#[async_trait]
impl<C, B> AsyncIterator for BlobSource<C, B>
where
    C: ChainProvider + Send,
    B: BlobProvider + Send,
{
    type Item = Bytes;

    async fn next(&mut self) -> PipelineResult<Self::Item> {
        self.load_blobs().await?;

        let next_data = match self.next_data() {
            Ok(d) => d,
            Err(e) => return e,
        };

        // Calldata entries are passed through unchanged.
        if let Some(calldata) = next_data.calldata {
            return Ok(calldata);
        }

        // Decode the blob body, or skip the blob and advance.
        match next_data.decode() {
            Ok(d) => Ok(d),
            Err(_) => {
                warn!(target: "blob-source", "Failed to decode blob data, skipping");
                self.next().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ChainProviderError, ResetError},
        traits::test_utils::{TestBlobProvider, TestChainProvider},
    };
    use alloy_consensus::{Signed, TxEip4844, TxLegacy};
    use alloy_primitives::{address, Signature, B256};
    use reef_primitives::Blob;

    const BATCH_INBOX: Address = address!("ff00000000000000000000000000000000000010");

    fn blob_tx(to: Address, input: Bytes, blob_hashes: Vec<B256>) -> TxEnvelope {
        let tx = TxEip4844 { to, blob_versioned_hashes: blob_hashes, input, ..Default::default() };
        TxEnvelope::Eip4844(Signed::new_unchecked(
            TxEip4844Variant::TxEip4844(tx),
            Signature::test_signature(),
            B256::ZERO,
        ))
    }

    fn calldata_tx(to: TxKind, input: Bytes) -> TxEnvelope {
        let tx = TxLegacy { to, input, ..Default::default() };
        TxEnvelope::Legacy(Signed::new_unchecked(tx, Signature::test_signature(), B256::ZERO))
    }

    fn sender_of(tx: &TxEnvelope) -> Address {
        tx.recover_public_key().unwrap()
    }

    fn source_for(
        txs: Vec<TxEnvelope>,
        batcher_address: Address,
        blobs: Vec<(IndexedBlobHash, Blob)>,
    ) -> BlobSource<TestChainProvider, TestBlobProvider> {
        let block_ref = BlockInfo { hash: B256::from([0xAB; 32]), ..Default::default() };
        let mut chain_provider = TestChainProvider::default();
        chain_provider.insert_block_with_transactions(block_ref, txs);
        let mut blob_fetcher = TestBlobProvider::default();
        blob_fetcher.insert_blobs(block_ref.hash, blobs);
        BlobSource::new(chain_provider, blob_fetcher, BATCH_INBOX, batcher_address, block_ref)
    }

    #[tokio::test]
    async fn yields_decoded_blobs_in_transaction_and_index_order() {
        let hash_a = B256::from([1; 32]);
        let hash_b = B256::from([2; 32]);
        let valid = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash_a, hash_b]);
        let batcher = sender_of(&valid);

        // A foreign inbox transaction between the two valid ones still
        // advances the global blob index.
        let foreign =
            blob_tx(address!("ff00000000000000000000000000000000000099"), Bytes::new(), vec![
                B256::from([3; 32]),
            ]);
        let txs = vec![valid.clone(), foreign, valid];

        let payloads: [&[u8]; 4] = [b"one", b"two", b"three", b"four"];
        let blobs = vec![
            (IndexedBlobHash { index: 0, hash: hash_a }, Blob::from_data(payloads[0]).unwrap()),
            (IndexedBlobHash { index: 1, hash: hash_b }, Blob::from_data(payloads[1]).unwrap()),
            (IndexedBlobHash { index: 3, hash: hash_a }, Blob::from_data(payloads[2]).unwrap()),
            (IndexedBlobHash { index: 4, hash: hash_b }, Blob::from_data(payloads[3]).unwrap()),
        ];

        let mut source = source_for(txs, batcher, blobs);
        for expected in payloads {
            assert_eq!(source.next().await.unwrap(), Bytes::from(expected.to_vec()));
        }
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn ignores_transactions_from_other_senders() {
        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash]);
        let not_the_batcher = address!("0123456789012345678901234567890123456789");

        let mut source = source_for(vec![tx], not_the_batcher, vec![]);
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn passes_calldata_through_unchanged() {
        let calldata = Bytes::from_static(b"frame data");
        let tx = calldata_tx(TxKind::Call(BATCH_INBOX), calldata.clone());
        let batcher = sender_of(&tx);

        // A contract creation from the batcher is not inbox data.
        let create = calldata_tx(TxKind::Create, Bytes::from_static(b"code"));
        let mut source = source_for(vec![create, tx], batcher, vec![]);

        assert_eq!(source.next().await.unwrap(), calldata);
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn ignores_calldata_on_blob_transactions() {
        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::from_static(b"stray calldata"), vec![hash]);
        let batcher = sender_of(&tx);

        let blobs =
            vec![(IndexedBlobHash { index: 0, hash }, Blob::from_data(b"payload").unwrap())];
        let mut source = source_for(vec![tx], batcher, blobs);

        assert_eq!(source.next().await.unwrap(), Bytes::from_static(b"payload"));
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn skips_undecodable_blobs() {
        let hash_a = B256::from([1; 32]);
        let hash_b = B256::from([2; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash_a, hash_b]);
        let batcher = sender_of(&tx);

        let mut corrupt = Blob::from_data(b"unreachable").unwrap();
        corrupt[32] = 0x80;
        let blobs = vec![
            (IndexedBlobHash { index: 0, hash: hash_a }, corrupt),
            (IndexedBlobHash { index: 1, hash: hash_b }, Blob::from_data(b"second").unwrap()),
        ];

        let mut source = source_for(vec![tx], batcher, blobs);
        assert_eq!(source.next().await.unwrap(), Bytes::from_static(b"second"));
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn missing_block_resets_the_pipeline() {
        let block_ref = BlockInfo { hash: B256::from([0xCD; 32]), ..Default::default() };
        let mut source = BlobSource::new(
            TestChainProvider::default(),
            TestBlobProvider::default(),
            BATCH_INBOX,
            Address::ZERO,
            block_ref,
        );
        assert_eq!(
            source.next().await,
            Err(ResetError::MissingBlock(block_ref.hash).reset())
        );
    }

    #[tokio::test]
    async fn missing_blobs_reset_the_pipeline() {
        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash]);
        let batcher = sender_of(&tx);

        // The blob fetcher has no blobs for the block.
        let mut source = source_for(vec![tx], batcher, vec![]);
        assert_eq!(source.next().await, Err(ResetError::MissingBlobs.reset()));
    }

    #[tokio::test]
    async fn backend_failures_are_temporary() {
        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash]);
        let batcher = sender_of(&tx);

        let mut source = source_for(vec![tx.clone()], batcher, vec![]);
        source.chain_provider.error =
            Some(ChainProviderError::Backend("connection refused".into()));
        assert!(matches!(source.next().await, Err(PipelineErrorKind::Temporary(_))));

        let mut source = source_for(vec![tx], batcher, vec![]);
        source.blob_fetcher.error = Some(BlobProviderError::Backend("timeout".into()));
        assert!(matches!(source.next().await, Err(PipelineErrorKind::Temporary(_))));
    }

    #[tokio::test]
    async fn short_blob_responses_reset_the_pipeline() {
        struct ShortBlobProvider;

        #[async_trait]
        impl BlobProvider for ShortBlobProvider {
            async fn get_blobs(
                &mut self,
                _block_ref: &BlockInfo,
                _blob_hashes: &[IndexedBlobHash],
            ) -> Result<Vec<Blob>, BlobProviderError> {
                Ok(Vec::new())
            }
        }

        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash]);
        let batcher = sender_of(&tx);

        let block_ref = BlockInfo { hash: B256::from([0xAB; 32]), ..Default::default() };
        let mut chain_provider = TestChainProvider::default();
        chain_provider.insert_block_with_transactions(block_ref, vec![tx]);
        let mut source =
            BlobSource::new(chain_provider, ShortBlobProvider, BATCH_INBOX, batcher, block_ref);

        assert_eq!(source.next().await, Err(ResetError::MissingBlobs.reset()));
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let hash = B256::from([1; 32]);
        let tx = blob_tx(BATCH_INBOX, Bytes::new(), vec![hash]);
        let batcher = sender_of(&tx);

        let blobs = vec![
            (IndexedBlobHash { index: 0, hash }, Blob::from_data(b"cached").unwrap()),
        ];
        let mut source = source_for(vec![tx], batcher, blobs);

        assert_eq!(source.next().await.unwrap(), Bytes::from_static(b"cached"));

        // Once open, the source serves from its cached entries and does not
        // refetch the block.
        source.chain_provider.clear();
        source.chain_provider.error =
            Some(ChainProviderError::Backend("unreachable".into()));
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }

    #[tokio::test]
    async fn empty_blocks_are_immediately_exhausted() {
        let mut source = source_for(vec![], Address::ZERO, vec![]);
        assert_eq!(source.next().await, Err(PipelineError::Eof.temp()));
    }
}
