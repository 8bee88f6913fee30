use crate::types::dataset::{DatasetKind, LocationShape};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Unknown output format '{0}', expected 'netcdf' or 'csv'")]
    UnknownOutputFormat(String),

    #[error("A query needs at least one parameter code")]
    NoParameters,

    #[error("Invalid parameter code '{0}'")]
    InvalidParameter(String),

    #[error("A station query needs at least one station")]
    NoStations,

    #[error("Station '{0}' is listed more than once")]
    DuplicateStation(String),

    #[error("Dataset {dataset} expects a {expected} location, got a {found}")]
    ShapeMismatch {
        dataset: DatasetKind,
        expected: LocationShape,
        found: LocationShape,
    },

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DD HH:MM")]
    InvalidTimestamp(String, #[source] chrono::ParseError),

    #[error("Time range starts at {start} which is after its end {end}")]
    InvertedRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Failed to read saved query '{0}'")]
    SavedQueryRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write saved query '{0}'")]
    SavedQueryWrite(PathBuf, #[source] std::io::Error),

    #[error("Malformed saved query")]
    SavedQueryFormat(#[from] csv::Error),

    #[error("Saved query is missing key '{0}'")]
    MissingKey(&'static str),

    #[error("Invalid value '{value}' for key '{key}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Value '{0}' cannot be stored in a saved query")]
    UnencodableValue(String),
}
