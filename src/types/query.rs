//! The user's request: which product, which parameters, where, and in which format.

use crate::types::dataset::{DatasetKind, LocationShape, QUALITY_FLAG_PARAMETER};
use crate::types::error::QueryError;
use crate::types::station::Station;
use bon::bon;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// File format requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    NetCdf,
    Csv,
}

impl OutputFormat {
    /// Value of the `output_format=` query parameter.
    pub fn api_name(&self) -> &'static str {
        match self {
            OutputFormat::NetCdf => "netcdf",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::NetCdf => "nc",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

impl FromStr for OutputFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "netcdf" => Ok(OutputFormat::NetCdf),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(QueryError::UnknownOutputFormat(s.to_string())),
        }
    }
}

/// A lat/lon box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// `lat_min,lon_min,lat_max,lon_max`, the order the `bbox=` parameter expects.
    pub fn to_query_value(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lat_min, self.lon_min, self.lat_max, self.lon_max
        )
    }
}

/// Where data is requested for. Exactly one of the three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    BoundingBox(BoundingBox),
    Point { lat: f64, lon: f64 },
    Stations(Vec<Station>),
}

impl Location {
    pub fn shape(&self) -> LocationShape {
        match self {
            Location::BoundingBox(_) => LocationShape::Area,
            Location::Point { .. } => LocationShape::Point,
            Location::Stations(_) => LocationShape::Station,
        }
    }
}

/// A validated, immutable download request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub(crate) dataset: DatasetKind,
    pub(crate) params: Vec<String>,
    pub(crate) location: Location,
    pub(crate) location_label: String,
    pub(crate) output_format: OutputFormat,
    pub(crate) annual_slices: bool,
}

#[bon]
impl QuerySpec {
    /// Builds and validates a query.
    ///
    /// Parameter order is kept as given, since it ends up in URLs and file
    /// names. For the 10-minute station dataset the quality flag parameter is
    /// appended when missing.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] when the parameter list is empty, the location
    /// shape does not fit the dataset, the bounding box is inverted, or a
    /// station appears twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use zamg_datahub::{BoundingBox, DatasetKind, Location, QuerySpec};
    ///
    /// let query = QuerySpec::builder()
    ///     .dataset(DatasetKind::Inca)
    ///     .params(vec!["T2M".to_string()])
    ///     .location(Location::BoundingBox(BoundingBox {
    ///         lat_min: 46.6,
    ///         lon_min: 10.5,
    ///         lat_max: 47.3,
    ///         lon_max: 11.4,
    ///     }))
    ///     .location_label("oetztal")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(query.params(), ["T2M"]);
    /// ```
    #[builder]
    pub fn new(
        dataset: DatasetKind,
        params: Vec<String>,
        location: Location,
        #[builder(into)] location_label: String,
        #[builder(default)] output_format: OutputFormat,
        #[builder(default = true)] annual_slices: bool,
    ) -> Result<Self, QueryError> {
        let mut params = params;
        if dataset.requires_quality_flag() && !params.iter().any(|p| p == QUALITY_FLAG_PARAMETER)
        {
            params.push(QUALITY_FLAG_PARAMETER.to_string());
        }
        let query = Self {
            dataset,
            params,
            location,
            location_label,
            output_format,
            annual_slices,
        };
        query.validate()?;
        Ok(query)
    }
}

impl QuerySpec {
    pub fn dataset(&self) -> DatasetKind {
        self.dataset
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn location_label(&self) -> &str {
        &self.location_label
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Whether station requests are cut into calendar years.
    pub fn annual_slices(&self) -> bool {
        self.annual_slices
    }

    pub fn stations(&self) -> &[Station] {
        match &self.location {
            Location::Stations(stations) => stations,
            _ => &[],
        }
    }

    /// Checks every invariant a query has to satisfy before it is planned.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.params.is_empty() {
            return Err(QueryError::NoParameters);
        }
        if let Some(bad) = self
            .params
            .iter()
            .find(|p| p.trim().is_empty() || p.contains([',', '&', '=', ' ']))
        {
            return Err(QueryError::InvalidParameter(bad.clone()));
        }

        let expected = self.dataset.shape();
        let found = self.location.shape();
        if expected != found {
            return Err(QueryError::ShapeMismatch {
                dataset: self.dataset,
                expected,
                found,
            });
        }

        match &self.location {
            Location::BoundingBox(bbox) => {
                if bbox.lat_min > bbox.lat_max || bbox.lon_min > bbox.lon_max {
                    return Err(QueryError::InvalidBoundingBox(bbox.to_query_value()));
                }
            }
            Location::Point { .. } => {}
            Location::Stations(stations) => {
                if stations.is_empty() {
                    return Err(QueryError::NoStations);
                }
                let mut seen = HashSet::new();
                if let Some(dup) = stations.iter().find(|s| !seen.insert(s.id.as_str())) {
                    return Err(QueryError::DuplicateStation(dup.id.clone()));
                }
            }
        }
        Ok(())
    }
}
