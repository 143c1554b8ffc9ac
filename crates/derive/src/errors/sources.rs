//! Error types for the data sources and their providers.

use super::{PipelineError, PipelineErrorKind, ResetError};
use alloc::string::{String, ToString};
use alloy_primitives::B256;
use reef_primitives::BlobDecodingError;
use thiserror::Error;

/// An error returned by a [ChainProvider].
///
/// [ChainProvider]: crate::traits::ChainProvider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainProviderError {
    /// The requested block does not exist upstream.
    #[error("Block not found: {0}")]
    BlockNotFound(B256),
    /// Error pertaining to the backend transport.
    #[error("{0}")]
    Backend(String),
}

impl From<ChainProviderError> for PipelineErrorKind {
    fn from(val: ChainProviderError) -> Self {
        match val {
            ChainProviderError::BlockNotFound(hash) => ResetError::MissingBlock(hash).reset(),
            ChainProviderError::Backend(msg) => PipelineError::Provider(msg).temp(),
        }
    }
}

/// An error returned by a [BlobProvider].
///
/// [BlobProvider]: crate::traits::BlobProvider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobProviderError {
    /// The number of specified blob hashes did not match the number of
    /// returned blobs.
    #[error("Blob sidecar length mismatch: expected {0}, got {1}")]
    SidecarLengthMismatch(usize, usize),
    /// The referenced blobs are not available upstream.
    #[error("Blobs not found for the given hashes")]
    BlobsNotFound,
    /// Blob decoding error.
    #[error("Blob decoding error: {0}")]
    BlobDecoding(#[from] BlobDecodingError),
    /// Error pertaining to the backend transport.
    #[error("{0}")]
    Backend(String),
}

impl From<BlobProviderError> for PipelineErrorKind {
    fn from(val: BlobProviderError) -> Self {
        match val {
            BlobProviderError::SidecarLengthMismatch(_, _) => ResetError::MissingBlobs.reset(),
            BlobProviderError::BlobsNotFound => ResetError::MissingBlobs.reset(),
            BlobProviderError::BlobDecoding(err) => {
                PipelineError::Provider(err.to_string()).crit()
            }
            BlobProviderError::Backend(msg) => PipelineError::Provider(msg).temp(),
        }
    }
}
