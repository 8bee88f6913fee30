use crate::retrieval::error::TransportError;
use crate::types::dataset::DatasetKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} is not a station dataset")]
    NotStationDataset(DatasetKind),

    #[error("Failed to download station metadata")]
    Transport(#[from] TransportError),

    #[error("Failed to parse station metadata")]
    JsonParse(#[from] serde_json::Error),

    #[error("Station {station} has an unreadable valid_from date '{value}'")]
    InvalidDate { station: String, value: String },

    #[error("Station '{0}' is not in the catalog")]
    UnknownStation(String),
}
