//! Error types for the data source adapter.

mod pipeline;
pub use pipeline::{PipelineError, PipelineErrorKind, PipelineResult, ResetError};

mod sources;
pub use sources::{BlobProviderError, ChainProviderError};
