//! Contains the [BlobData] placeholder filled by the blob source.

use crate::errors::BlobProviderError;
use alloy_primitives::Bytes;
use reef_primitives::{Blob, BlobDecodingError};

/// One batcher transaction's data entry: either a blob body resolved after
/// fetching, or inline calldata passed through unchanged.
#[derive(Default, Clone, Debug)]
pub struct BlobData {
    /// The blob body, filled once fetched.
    pub data: Option<Blob>,
    /// The transaction calldata.
    pub calldata: Option<Bytes>,
}

impl BlobData {
    /// Decodes the blob body into raw payload bytes.
    /// Returns a [BlobDecodingError] if the blob is invalid or unfilled.
    pub fn decode(&self) -> Result<Bytes, BlobDecodingError> {
        let blob = self.data.as_ref().ok_or(BlobDecodingError::MissingData)?;
        blob.decode()
    }

    /// Fills in the blob body from the fetched list. Returns whether a
    /// fetched blob was consumed; calldata entries are left untouched.
    pub fn fill(&mut self, blobs: &[Blob], index: usize) -> Result<bool, BlobProviderError> {
        if self.calldata.is_some() {
            return Ok(false);
        }
        let blob = blobs.get(index).ok_or(BlobProviderError::BlobsNotFound)?;
        self.data = Some(*blob);
        Ok(true)
    }

    /// Returns whether the entry carries neither a blob nor calldata.
    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.calldata.is_none()
    }
}
