use crate::retrieval::transport::Transport;
use crate::stations::error::CatalogError;
use crate::types::dataset::{DatasetKind, LocationShape};
use crate::types::station::Station;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    stations: Vec<StationRecord>,
}

#[derive(Debug, Deserialize)]
struct StationRecord {
    id: StationId,
    name: String,
    valid_from: String,
}

// The hub serves ids as strings on some endpoints and as numbers on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StationId {
    Text(String),
    Number(i64),
}

impl StationId {
    fn into_string(self) -> String {
        match self {
            StationId::Text(s) => s,
            StationId::Number(n) => n.to_string(),
        }
    }
}

fn parse_valid_from(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.naive_utc());
        }
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Stations offered by a station dataset, with their first available timestamp.
#[derive(Debug, Clone, Default)]
pub struct StationCatalog {
    stations: Vec<Station>,
    index: HashMap<String, usize>,
}

impl StationCatalog {
    /// Parses the dataset's `metadata` document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CatalogError> {
        let document: MetadataDocument = serde_json::from_slice(bytes)?;
        let stations = document
            .stations
            .into_iter()
            .map(|record| {
                let id = record.id.into_string();
                let earliest_start =
                    parse_valid_from(&record.valid_from).ok_or_else(|| CatalogError::InvalidDate {
                        station: id.clone(),
                        value: record.valid_from.clone(),
                    })?;
                Ok(Station::new(id, record.name, earliest_start))
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        debug!("Parsed {} stations from metadata", stations.len());
        Ok(Self::from_stations(stations))
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        let index = stations
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        Self { stations, index }
    }

    /// Downloads `{base_url}/{endpoint}/metadata` for a station dataset.
    pub async fn fetch<T: Transport + ?Sized>(
        transport: &T,
        base_url: &str,
        kind: DatasetKind,
    ) -> Result<Self, CatalogError> {
        if kind.shape() != LocationShape::Station {
            return Err(CatalogError::NotStationDataset(kind));
        }
        let url = format!(
            "{}/{}/metadata",
            base_url.trim_end_matches('/'),
            kind.endpoint()
        );
        info!("Fetching station metadata from {}", url);
        let body = transport.get(&url).await?;
        let catalog = Self::from_json(&body)?;
        info!("Loaded {} stations for {}", catalog.len(), kind);
        Ok(catalog)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.index.get(id).map(|&i| &self.stations[i])
    }

    /// Looks up `ids` in the order given.
    pub fn select<I, S>(&self, ids: I) -> Result<Vec<Station>, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id)
                    .cloned()
                    .ok_or_else(|| CatalogError::UnknownStation(id.to_string()))
            })
            .collect()
    }
}
