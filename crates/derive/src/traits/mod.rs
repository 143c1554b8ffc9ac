//! This module contains the traits describing the seams between the data
//! source adapter, its parent chain providers, and the derivation pipeline.

mod data_sources;
pub use data_sources::{AsyncIterator, DataAvailabilityProvider};

mod providers;
pub use providers::ChainProvider;

mod blobs;
pub use blobs::{BlobProvider, InMemoryBlobProvider};

mod ecrecover;
pub use ecrecover::{RecoveryError, SignedRecoverable};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
