//! Pipeline error types.

use thiserror::Error;

use crate::annotator::TaggerError;
use crate::repository::DieselError;
use crate::services::{DictionaryError, DiscoveryError, FetchError};
use crate::sources::SourceError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The stage was cancelled because the pipeline is aborting.
    #[error("interrupted")]
    Interrupted,

    #[error("stage panicked: {0}")]
    Panicked(String),

    #[error("database error: {0}")]
    Database(#[from] DieselError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Tagger(#[from] TaggerError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}
