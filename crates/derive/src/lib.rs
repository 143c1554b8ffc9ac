#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::{
        errors::{PipelineError, PipelineErrorKind, PipelineResult, ResetError},
        sources::{BlobSource, EthereumDataSource},
        traits::{AsyncIterator, BlobProvider, ChainProvider, DataAvailabilityProvider},
    };
}

pub mod errors;
pub mod sources;
pub mod traits;
