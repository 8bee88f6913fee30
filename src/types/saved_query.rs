//! Saving a [`QuerySpec`] to a tab-separated key/value text file and reading it back.
//!
//! The file has a header row (`\tquery`) followed by one `key\tvalue` row per
//! attribute. List-valued attributes are comma-joined.

use crate::types::dataset::DatasetKind;
use crate::types::error::QueryError;
use crate::types::query::{BoundingBox, Location, OutputFormat, QuerySpec};
use crate::types::station::Station;
use crate::types::time_range::parse_timestamp;
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const VALUE_COLUMN: &str = "query";

impl QuerySpec {
    /// Default file stem: `{DATASET}_query_{location label}`.
    pub fn default_saved_name(&self) -> String {
        format!("{}_query_{}", self.dataset.api_name(), self.location_label)
    }

    /// Writes the query to `{dir}/{file_name}.txt` and returns the path.
    pub async fn save(&self, dir: &Path, file_name: Option<&str>) -> Result<PathBuf, QueryError> {
        let name = file_name
            .map(str::to_string)
            .unwrap_or_else(|| self.default_saved_name());
        let path = dir.join(format!("{name}.txt"));
        let text = self.to_saved_text()?;
        fs::write(&path, text)
            .await
            .map_err(|e| QueryError::SavedQueryWrite(path.clone(), e))?;
        info!("Query saved to {}", path.display());
        Ok(path)
    }

    /// Reads a query previously written by [`QuerySpec::save`].
    pub async fn load(path: &Path) -> Result<Self, QueryError> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| QueryError::SavedQueryRead(path.to_path_buf(), e))?;
        Self::from_saved_text(&text)
    }

    pub fn to_saved_text(&self) -> Result<String, QueryError> {
        let mut rows: Vec<(&str, String)> = vec![
            ("dataset", self.dataset.api_name().to_string()),
            ("params", join_list(self.params.iter().map(String::as_str))?),
            ("location_label", self.location_label.clone()),
            ("output_format", self.output_format.api_name().to_string()),
            ("file_extension", self.output_format.extension().to_string()),
            ("annual_slices", self.annual_slices.to_string()),
        ];
        match &self.location {
            Location::BoundingBox(bbox) => {
                rows.push(("lat_min", bbox.lat_min.to_string()));
                rows.push(("lat_max", bbox.lat_max.to_string()));
                rows.push(("lon_min", bbox.lon_min.to_string()));
                rows.push(("lon_max", bbox.lon_max.to_string()));
            }
            Location::Point { lat, lon } => {
                rows.push(("lat", lat.to_string()));
                rows.push(("lon", lon.to_string()));
            }
            Location::Stations(stations) => {
                rows.push(("station_ids", join_list(stations.iter().map(|s| s.id.as_str()))?));
                rows.push((
                    "station_names",
                    join_list(stations.iter().map(|s| s.name.as_str()))?,
                ));
                let starts: Vec<String> = stations.iter().map(Station::earliest_start_text).collect();
                rows.push(("station_starts", join_list(starts.iter().map(String::as_str))?));
            }
        }

        let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(Vec::new());
        writer.write_record(["", VALUE_COLUMN])?;
        for (key, value) in &rows {
            if value.contains(['\t', '\n', '\r']) {
                return Err(QueryError::UnencodableValue(value.clone()));
            }
            writer.write_record([*key, value.as_str()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| QueryError::SavedQueryFormat(e.into_error().into()))?;
        String::from_utf8(bytes).map_err(|e| QueryError::UnencodableValue(e.to_string()))
    }

    pub fn from_saved_text(text: &str) -> Result<Self, QueryError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(text.as_bytes());
        let mut values = HashMap::new();
        for record in reader.records() {
            let record = record?;
            if let (Some(key), Some(value)) = (record.get(0), record.get(1)) {
                values.insert(key.to_string(), value.to_string());
            }
        }
        let saved = SavedValues(values);

        let dataset: DatasetKind = saved.get("dataset")?.parse()?;
        let output_format: OutputFormat = saved.get("output_format")?.parse()?;
        let params = split_list(saved.get("params")?);
        let annual_slices = match saved.0.get("annual_slices") {
            Some(flag) => flag.trim().parse().map_err(|_| QueryError::InvalidValue {
                key: "annual_slices",
                value: flag.clone(),
            })?,
            None => true,
        };

        let location = if saved.0.contains_key("station_ids") {
            let ids = split_list(saved.get("station_ids")?);
            let names = split_list(saved.get("station_names")?);
            let starts = split_list(saved.get("station_starts")?);
            if ids.len() != names.len() || ids.len() != starts.len() {
                return Err(QueryError::InvalidValue {
                    key: "station_ids",
                    value: saved.get("station_ids")?.to_string(),
                });
            }
            let stations = ids
                .into_iter()
                .zip(names)
                .zip(starts)
                .map(|((id, name), start)| -> Result<Station, QueryError> {
                    Ok(Station::new(id, name, parse_timestamp(&start)?))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Location::Stations(stations)
        } else if saved.0.contains_key("lat_min") {
            Location::BoundingBox(BoundingBox {
                lat_min: saved.float("lat_min")?,
                lon_min: saved.float("lon_min")?,
                lat_max: saved.float("lat_max")?,
                lon_max: saved.float("lon_max")?,
            })
        } else {
            Location::Point {
                lat: saved.float("lat")?,
                lon: saved.float("lon")?,
            }
        };

        QuerySpec::builder()
            .dataset(dataset)
            .params(params)
            .location(location)
            .location_label(saved.get("location_label")?)
            .output_format(output_format)
            .annual_slices(annual_slices)
            .build()
    }
}

struct SavedValues(HashMap<String, String>);

impl SavedValues {
    fn get(&self, key: &'static str) -> Result<&str, QueryError> {
        self.0
            .get(key)
            .map(String::as_str)
            .ok_or(QueryError::MissingKey(key))
    }

    fn float(&self, key: &'static str) -> Result<f64, QueryError> {
        let value = self.get(key)?;
        value.trim().parse().map_err(|_| QueryError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}

fn join_list<'a>(items: impl Iterator<Item = &'a str>) -> Result<String, QueryError> {
    let items: Vec<&str> = items.collect();
    if let Some(bad) = items.iter().find(|item| item.contains(',')) {
        return Err(QueryError::UnencodableValue(bad.to_string()));
    }
    Ok(items.join(","))
}

// Items are kept verbatim: station paths are built from them.
fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}
