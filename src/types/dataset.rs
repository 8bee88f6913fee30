//! Defines the closed set of data hub products and the static facts the
//! planner needs about each of them (endpoint, location shape, file label).

use crate::types::error::QueryError;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

/// Root of the public dataset API.
pub const DEFAULT_BASE_URL: &str = "https://dataset.api.hub.zamg.ac.at/v1";

/// Parameter code the 10-minute station endpoint insists on receiving.
pub const QUALITY_FLAG_PARAMETER: &str = "QFLAG";

/// The kind of location a dataset is queried with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationShape {
    /// A lat/lon bounding box (gridded fields).
    Area,
    /// A single lon/lat coordinate (point timeseries).
    Point,
    /// A set of station identifiers.
    Station,
}

impl fmt::Display for LocationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LocationShape::Area => "bounding box",
            LocationShape::Point => "point",
            LocationShape::Station => "station set",
        };
        write!(f, "{name}")
    }
}

/// A product served by the data hub.
///
/// Every variant maps to exactly one [`DatasetDescriptor`], so adding a
/// product means adding one match arm and one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    /// INCA analysis, hourly, 1 km grid.
    Inca,
    /// INCA analysis, 15 minutes, 1 km grid.
    Inca15Min,
    /// SPARTACUS, daily, 1 km grid.
    Spartacus,
    /// SNOWGRID climate, daily, 1 km grid.
    Snowgrid,
    /// INCA hourly timeseries at a single point.
    IncaPoint,
    /// SPARTACUS daily timeseries at a single point.
    SpartacusPoint,
    /// Station observations, 10 minutes.
    Station10Min,
    /// Station observations, hourly.
    Station1H,
}

/// Static facts about one [`DatasetKind`].
#[derive(Debug)]
pub struct DatasetDescriptor {
    pub api_name: &'static str,
    pub endpoint: &'static str,
    pub shape: LocationShape,
    pub filename_label: &'static str,
    /// Earliest (year, month, day) the provider serves, if the product has a global floor.
    pub data_floor: Option<(i32, u32, u32)>,
    pub requires_quality_flag: bool,
}

const INCA: DatasetDescriptor = DatasetDescriptor {
    api_name: "INCA",
    endpoint: "grid/historical/inca-v1-1h-1km",
    shape: LocationShape::Area,
    filename_label: "incal-hourly",
    data_floor: Some((2011, 3, 1)),
    requires_quality_flag: false,
};

const INCA_15MIN: DatasetDescriptor = DatasetDescriptor {
    api_name: "INCA_15min",
    endpoint: "grid/historical/inca-v1-15min-1km",
    shape: LocationShape::Area,
    filename_label: "incal-15min",
    data_floor: Some((2011, 3, 1)),
    requires_quality_flag: false,
};

const SPARTACUS: DatasetDescriptor = DatasetDescriptor {
    api_name: "SPARTACUS",
    endpoint: "grid/historical/spartacus-v1-1d-1km",
    shape: LocationShape::Area,
    filename_label: "spartacus-daily",
    data_floor: Some((1961, 1, 1)),
    requires_quality_flag: false,
};

const SNOWGRID: DatasetDescriptor = DatasetDescriptor {
    api_name: "SNOWGRID",
    endpoint: "grid/historical/snowgrid_cl-v2-1d-1km",
    shape: LocationShape::Area,
    filename_label: "snowgrid-daily",
    data_floor: Some((1961, 1, 1)),
    requires_quality_flag: false,
};

const INCA_POINT: DatasetDescriptor = DatasetDescriptor {
    api_name: "INCA_POINT",
    endpoint: "timeseries/historical/inca-v1-1h-1km",
    shape: LocationShape::Point,
    filename_label: "incal-hourly-point",
    data_floor: Some((2011, 3, 1)),
    requires_quality_flag: false,
};

const SPARTACUS_POINT: DatasetDescriptor = DatasetDescriptor {
    api_name: "SPARTACUS_POINT",
    endpoint: "timeseries/historical/spartacus-v1-1d-1km",
    shape: LocationShape::Point,
    filename_label: "spartacus-daily-point",
    data_floor: Some((1961, 1, 1)),
    requires_quality_flag: false,
};

const STATION_10MIN: DatasetDescriptor = DatasetDescriptor {
    api_name: "STATION_10min",
    endpoint: "station/historical/klima-v1-10min",
    shape: LocationShape::Station,
    filename_label: "klima-10min",
    data_floor: None,
    requires_quality_flag: true,
};

const STATION_1H: DatasetDescriptor = DatasetDescriptor {
    api_name: "STATION_1h",
    endpoint: "station/historical/klima-v1-1h",
    shape: LocationShape::Station,
    filename_label: "klima-hourly",
    data_floor: None,
    requires_quality_flag: false,
};

impl DatasetKind {
    pub const ALL: [DatasetKind; 8] = [
        DatasetKind::Inca,
        DatasetKind::Inca15Min,
        DatasetKind::Spartacus,
        DatasetKind::Snowgrid,
        DatasetKind::IncaPoint,
        DatasetKind::SpartacusPoint,
        DatasetKind::Station10Min,
        DatasetKind::Station1H,
    ];

    pub fn descriptor(&self) -> &'static DatasetDescriptor {
        match self {
            DatasetKind::Inca => &INCA,
            DatasetKind::Inca15Min => &INCA_15MIN,
            DatasetKind::Spartacus => &SPARTACUS,
            DatasetKind::Snowgrid => &SNOWGRID,
            DatasetKind::IncaPoint => &INCA_POINT,
            DatasetKind::SpartacusPoint => &SPARTACUS_POINT,
            DatasetKind::Station10Min => &STATION_10MIN,
            DatasetKind::Station1H => &STATION_1H,
        }
    }

    pub fn api_name(&self) -> &'static str {
        self.descriptor().api_name
    }

    /// Path of the dataset below the API root, without leading slash.
    pub fn endpoint(&self) -> &'static str {
        self.descriptor().endpoint
    }

    pub fn shape(&self) -> LocationShape {
        self.descriptor().shape
    }

    /// Prefix used for every file downloaded from this dataset.
    pub fn filename_label(&self) -> &'static str {
        self.descriptor().filename_label
    }

    /// Earliest timestamp the provider has data for.
    pub fn data_floor(&self) -> Option<NaiveDateTime> {
        let (year, month, day) = self.descriptor().data_floor?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
    }

    pub fn requires_quality_flag(&self) -> bool {
        self.descriptor().requires_quality_flag
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

impl FromStr for DatasetKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.api_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryError::UnknownDataset(s.to_string()))
    }
}
