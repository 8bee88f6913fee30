use crate::slicing::error::SliceError;
use crate::types::dataset::{DatasetKind, LocationShape};
use crate::types::error::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Dataset {dataset} expects a {expected} location, got a {found}")]
    ShapeMismatch {
        dataset: DatasetKind,
        expected: LocationShape,
        found: LocationShape,
    },

    #[error("Dataset {dataset} ({shape} location) cannot be planned this way")]
    UnsupportedSlicing {
        dataset: DatasetKind,
        shape: LocationShape,
    },

    #[error("Invalid query")]
    InvalidQuery(#[from] QueryError),

    #[error("Failed to slice the requested time range")]
    Slice(#[from] SliceError),
}
