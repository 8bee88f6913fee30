//! Timestamps, requested ranges and the slices they are cut into.

use crate::types::error::QueryError;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// Textual form of every timestamp a user hands in.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";
/// Form the API expects in `start=` / `end=`.
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Form embedded in file names.
pub const COMPACT_DATETIME_FORMAT: &str = "%Y%m%d%H%M";

/// Parses `YYYY-MM-DD HH:MM`, or a bare `YYYY-MM-DD` as midnight.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, QueryError> {
    let value = value.trim();
    match NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        Ok(dt) => Ok(dt),
        Err(err) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| QueryError::InvalidTimestamp(value.to_string(), err)),
    }
}

/// One bounded sub-range of a requested interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSlice {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlice {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn api_start(&self) -> String {
        self.start.format(API_DATETIME_FORMAT).to_string()
    }

    pub fn api_end(&self) -> String {
        self.end.format(API_DATETIME_FORMAT).to_string()
    }

    /// `YYYYMMDDHHMM-YYYYMMDDHHMM`
    pub fn compact(&self) -> String {
        format!(
            "{}-{}",
            self.start.format(COMPACT_DATETIME_FORMAT),
            self.end.format(COMPACT_DATETIME_FORMAT)
        )
    }
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(DATETIME_FORMAT),
            self.end.format(DATETIME_FORMAT)
        )
    }
}

/// A requested `[start, end]` interval. Construction guarantees `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two `YYYY-MM-DD HH:MM` strings.
    ///
    /// ```
    /// use zamg_datahub::TimeRange;
    ///
    /// let range = TimeRange::parse("2020-01-01 00:00", "2020-02-01 00:00").unwrap();
    /// assert_eq!(range.to_string(), "2020-01-01 00:00 - 2020-02-01 00:00");
    /// assert!(TimeRange::parse("2020-02-01 00:00", "2020-01-01 00:00").is_err());
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Self, QueryError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn as_slice(&self) -> TimeSlice {
        TimeSlice::new(self.start, self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt(f)
    }
}
