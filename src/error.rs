use crate::merging::error::MergeError;
use crate::planning::error::PlanError;
use crate::retrieval::error::{BatchError, RetrieveError, TransportError};
use crate::slicing::error::SliceError;
use crate::stations::error::CatalogError;
use crate::types::error::QueryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataHubError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to read token file '{0}'")]
    TokenRead(PathBuf, #[source] std::io::Error),

    #[error("Token file '{0}' is empty")]
    EmptyToken(PathBuf),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Output path exists but is not a directory: {0}")]
    OutputNotDirectory(PathBuf),
}
