//! This module contains the severity classified errors surfaced to the
//! derivation pipeline.

use alloc::string::String;
use alloy_primitives::B256;
use reef_primitives::SystemConfigUpdateError;
use thiserror::Error;

/// A result type alias for pipeline facing operations.
pub type PipelineResult<T> = Result<T, PipelineErrorKind>;

/// A top level filter for [PipelineError] that sorts by severity.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// A temporary error: the operation may succeed if retried.
    #[error("Temporary error: {0}")]
    Temporary(#[source] PipelineError),
    /// A critical error: derivation must halt.
    #[error("Critical error: {0}")]
    Critical(#[source] PipelineError),
    /// A reset error: upstream data disappeared and the pipeline must
    /// rewind.
    #[error("Pipeline reset: {0}")]
    Reset(#[from] ResetError),
}

/// An error encountered while producing data for the pipeline.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    /// The data source is exhausted for the current block.
    #[error("EOF")]
    Eof,
    /// Provider error variant.
    #[error("Provider error: {0}")]
    Provider(String),
    /// A malformed system config update event.
    #[error("Error updating system config: {0}")]
    SystemConfigUpdate(#[from] SystemConfigUpdateError),
}

impl PipelineError {
    /// Wrap [PipelineError] as a [PipelineErrorKind::Critical].
    pub const fn crit(self) -> PipelineErrorKind {
        PipelineErrorKind::Critical(self)
    }

    /// Wrap [PipelineError] as a [PipelineErrorKind::Temporary].
    pub const fn temp(self) -> PipelineErrorKind {
        PipelineErrorKind::Temporary(self)
    }
}

/// A reset error
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ResetError {
    /// The block the source was opened at disappeared from the parent
    /// chain.
    #[error("Missing parent chain block: {0}")]
    MissingBlock(B256),
    /// Blobs referenced by the opened block are no longer available.
    #[error("Missing blobs for parent chain block")]
    MissingBlobs,
}

impl ResetError {
    /// Wrap [ResetError] as a [PipelineErrorKind::Reset].
    pub const fn reset(self) -> PipelineErrorKind {
        PipelineErrorKind::Reset(self)
    }
}

impl From<SystemConfigUpdateError> for PipelineErrorKind {
    fn from(err: SystemConfigUpdateError) -> Self {
        PipelineError::SystemConfigUpdate(err).crit()
    }
}
