//! Maps a [`QuerySpec`] plus a time range onto the ordered list of downloads
//! needed to cover it.

use crate::planning::error::PlanError;
use crate::planning::request_item::RequestItem;
use crate::slicing::slicer::{slice_by_calendar_months, slice_by_calendar_year, slice_by_fixed_window};
use crate::types::dataset::{LocationShape, DEFAULT_BASE_URL};
use crate::types::query::{Location, QuerySpec};
use crate::types::station::Station;
use crate::types::time_range::{TimeRange, TimeSlice};
use bon::bon;
use chrono::{Local, NaiveDateTime};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Builds URLs and destination paths. Holds no state besides its
/// configuration, so planning twice yields identical results.
#[derive(Debug, Clone)]
pub struct RequestPlanner {
    base_url: String,
    output_dir: PathBuf,
    token: Option<String>,
}

#[bon]
impl RequestPlanner {
    /// # Arguments
    ///
    /// * `.output_dir(..)`: **Required.** Directory every destination path is placed under.
    /// * `.base_url(..)`: Optional. API root, defaults to [`DEFAULT_BASE_URL`].
    /// * `.token(..)`: Optional. Authentication token appended as `&auth=` to every URL.
    #[builder]
    pub fn new(
        #[builder(into)] output_dir: PathBuf,
        #[builder(into, default = DEFAULT_BASE_URL.to_string())] base_url: String,
        #[builder(into)] token: Option<String>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            output_dir,
            token,
        }
    }

    /// Plans one calendar year of an area or point dataset as a series of
    /// month-based slices (see [`slice_by_calendar_months`]). The dataset's
    /// data floor keeps the first slice from starting too early, and
    /// `reference_now` (defaults to the local clock) keeps the last one from
    /// reaching into the future.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnsupportedSlicing`] for station datasets, which are sliced per station instead.
    #[builder]
    pub fn plan_year(
        &self,
        query: &QuerySpec,
        year: i32,
        #[builder(default = 1)] first_month: u32,
        #[builder(default = 12)] last_month: u32,
        #[builder(default = 2)] max_months: u32,
        max_days: Option<u32>,
        reference_now: Option<NaiveDateTime>,
    ) -> Result<Vec<RequestItem>, PlanError> {
        self.check_shape(query)?;
        query.validate()?;
        self.require_gridded(query)?;

        let slices = slice_by_calendar_months()
            .year(year)
            .first_month(first_month)
            .last_month(last_month)
            .max_months(max_months)
            .maybe_max_days(max_days)
            .maybe_earliest_allowed(query.dataset().data_floor())
            .reference_now(reference_now.unwrap_or_else(|| Local::now().naive_local()))
            .call()?;
        debug!("Planned {} slices of {} for {}", slices.len(), query.dataset(), year);

        slices
            .iter()
            .map(|slice| self.gridded_item(query, slice))
            .collect()
    }
}

impl RequestPlanner {
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Plans the downloads for `range`.
    ///
    /// Area and point datasets produce exactly one item. Station datasets
    /// produce, per station, either one item per calendar year (when the
    /// query asks for annual slices) or one item for the whole range. A
    /// station never gets requests before its own earliest start, and a
    /// station whose earliest start lies after the range is left out.
    ///
    /// # Errors
    ///
    /// [`PlanError::ShapeMismatch`] when the query's location does not fit its dataset.
    pub fn plan(&self, query: &QuerySpec, range: &TimeRange) -> Result<Vec<RequestItem>, PlanError> {
        self.check_shape(query)?;
        query.validate()?;
        match query.dataset().shape() {
            LocationShape::Area | LocationShape::Point => {
                Ok(vec![self.gridded_item(query, &range.as_slice())?])
            }
            LocationShape::Station => self.station_items(query, range),
        }
    }

    /// Plans an area or point dataset as fixed windows of `window_days` days.
    pub fn plan_windows(
        &self,
        query: &QuerySpec,
        range: &TimeRange,
        window_days: u32,
    ) -> Result<Vec<RequestItem>, PlanError> {
        self.check_shape(query)?;
        query.validate()?;
        self.require_gridded(query)?;
        slice_by_fixed_window(range.start(), range.end(), window_days)?
            .iter()
            .map(|slice| self.gridded_item(query, slice))
            .collect()
    }

    fn check_shape(&self, query: &QuerySpec) -> Result<(), PlanError> {
        let expected = query.dataset().shape();
        let found = query.location().shape();
        if expected != found {
            return Err(PlanError::ShapeMismatch {
                dataset: query.dataset(),
                expected,
                found,
            });
        }
        Ok(())
    }

    fn require_gridded(&self, query: &QuerySpec) -> Result<(), PlanError> {
        match query.dataset().shape() {
            LocationShape::Station => Err(PlanError::UnsupportedSlicing {
                dataset: query.dataset(),
                shape: LocationShape::Station,
            }),
            LocationShape::Area | LocationShape::Point => Ok(()),
        }
    }

    fn gridded_item(&self, query: &QuerySpec, slice: &TimeSlice) -> Result<RequestItem, PlanError> {
        let location = match query.location() {
            Location::BoundingBox(bbox) => format!("bbox={}", bbox.to_query_value()),
            Location::Point { lat, lon } => format!("lon={lon}&lat={lat}"),
            Location::Stations(_) => {
                return Err(PlanError::ShapeMismatch {
                    dataset: query.dataset(),
                    expected: query.dataset().shape(),
                    found: LocationShape::Station,
                })
            }
        };
        let params = query.params().join(",");
        let url = format!(
            "{}/{}?anonymous=true&parameters={}&start={}&end={}&{}&output_format={}",
            self.base_url,
            query.dataset().endpoint(),
            params,
            slice.api_start(),
            slice.api_end(),
            location,
            query.output_format().api_name(),
        );
        let file_name = format!(
            "{}_{}_{}_{}.{}",
            query.dataset().filename_label(),
            params,
            query.location_label(),
            slice.compact(),
            query.output_format().extension(),
        );
        Ok(RequestItem::new(
            self.authenticated(url),
            self.output_dir.join(file_name),
            None,
        ))
    }

    fn station_items(&self, query: &QuerySpec, range: &TimeRange) -> Result<Vec<RequestItem>, PlanError> {
        let mut items = Vec::new();
        for station in query.stations() {
            let start = range.start().max(station.earliest_start);
            if start > range.end() {
                warn!(
                    "Station {} only has data from {} on, skipping it for {}",
                    station.id, station.earliest_start, range
                );
                continue;
            }

            if query.annual_slices() {
                for slice in slice_by_calendar_year(start, range.end())? {
                    let suffix = slice.start.format("%Y").to_string();
                    items.push(self.station_item(query, station, &slice, &suffix));
                }
            } else {
                let slice = TimeSlice::new(start, range.end());
                let suffix = format!(
                    "{}-{}",
                    slice.start.format("%Y%m%d"),
                    slice.end.format("%Y%m%d")
                );
                items.push(self.station_item(query, station, &slice, &suffix));
            }
        }
        Ok(items)
    }

    fn station_item(&self, query: &QuerySpec, station: &Station, slice: &TimeSlice, suffix: &str) -> RequestItem {
        let params = query
            .params()
            .iter()
            .map(|param| format!("parameters={param}"))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!(
            "{}/{}?{}&start={}&end={}&station_ids={}&output_format={}&filename=dummy",
            self.base_url,
            query.dataset().endpoint(),
            params,
            slice.api_start(),
            slice.api_end(),
            station.id,
            query.output_format().api_name(),
        );
        let directory = station.directory_name();
        let file_name = format!(
            "{}_{}_{}.{}",
            directory,
            query.dataset().filename_label(),
            suffix,
            query.output_format().extension(),
        );
        RequestItem::new(
            self.authenticated(url),
            self.output_dir.join(&directory).join(file_name),
            Some(station.id.clone()),
        )
    }

    fn authenticated(&self, url: String) -> String {
        match &self.token {
            Some(token) => format!("{url}&auth={token}"),
            None => url,
        }
    }
}
