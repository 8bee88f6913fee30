//! Pure functions that split a `[start, end]` interval into ordered,
//! contiguous, non-overlapping slices. None of them perform I/O.

use crate::slicing::error::SliceError;
use crate::types::time_range::TimeSlice;
use bon::builder;
use chrono::{Datelike, DurationRound, Months, NaiveDate, NaiveDateTime, TimeDelta};

fn first_of_month(year: i32, month: u32) -> Result<NaiveDateTime, SliceError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or(SliceError::DateOverflow(year))
}

fn add_months(dt: NaiveDateTime, months: u32) -> Result<NaiveDateTime, SliceError> {
    dt.checked_add_months(Months::new(months))
        .ok_or(SliceError::DateOverflow(dt.year()))
}

fn check_month(month: u32) -> Result<u32, SliceError> {
    if (1..=12).contains(&month) {
        Ok(month)
    } else {
        Err(SliceError::InvalidMonth(month))
    }
}

/// Slices one calendar year into windows of at most `max_months` months.
///
/// Windows are anchored at the first day of `first_month` and end at the
/// first day after `last_month` at the latest. Nothing is requested before
/// `earliest_allowed` (the provider's data floor) or after `reference_now`
/// truncated to the full hour, so a slice list for the running year stops at
/// "now". When the whole year lies in the past the final slice ends at
/// `{year + 1}-01-01 00:00`.
///
/// With `max_days` set, every month becomes its own window and is split in
/// two: the first `max_days` days and the rest of the month. A second half
/// that would be empty is left out.
///
/// Consecutive slices share their boundary timestamp.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use zamg_datahub::slice_by_calendar_months;
///
/// let now = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// let slices = slice_by_calendar_months()
///     .year(2020)
///     .reference_now(now)
///     .call()
///     .unwrap();
/// assert_eq!(slices.len(), 6);
/// assert_eq!(slices[5].to_string(), "2020-11-01 00:00 - 2021-01-01 00:00");
/// ```
#[builder]
pub fn slice_by_calendar_months(
    year: i32,
    #[builder(default = 1)] first_month: u32,
    #[builder(default = 12)] last_month: u32,
    #[builder(default = 2)] max_months: u32,
    max_days: Option<u32>,
    earliest_allowed: Option<NaiveDateTime>,
    reference_now: NaiveDateTime,
) -> Result<Vec<TimeSlice>, SliceError> {
    let first_month = check_month(first_month)?;
    let last_month = check_month(last_month)?;
    if first_month > last_month {
        return Err(SliceError::MonthOrder {
            first: first_month,
            last: last_month,
        });
    }
    if max_months == 0 || max_days == Some(0) {
        return Err(if max_months == 0 {
            SliceError::ZeroMaxMonths
        } else {
            SliceError::ZeroWindow
        });
    }
    let step = if max_days.is_some() { 1 } else { max_months };

    let year_start = first_of_month(year, 1)?;
    let end_of_year = first_of_month(year + 1, 1)?;
    let after_last_month = add_months(year_start, last_month)?;
    let now = reference_now
        .duration_trunc(TimeDelta::hours(1))
        .unwrap_or(reference_now);
    let upper = end_of_year.min(after_last_month).min(now);

    let mut slices = Vec::new();
    let mut anchor = first_of_month(year, first_month)?;
    while anchor < upper {
        let window_end = add_months(anchor, step)?.min(upper);
        let start = match earliest_allowed {
            Some(floor) if floor > anchor => floor,
            _ => anchor,
        };
        if start < window_end {
            match max_days {
                None => slices.push(TimeSlice::new(start, window_end)),
                Some(days) => {
                    let middle = start
                        .checked_add_signed(TimeDelta::days(i64::from(days)))
                        .map_or(window_end, |mid| mid.min(window_end));
                    slices.push(TimeSlice::new(start, middle));
                    if middle < window_end {
                        slices.push(TimeSlice::new(middle, window_end));
                    }
                }
            }
        }
        anchor = add_months(anchor, step)?;
    }
    Ok(slices)
}

/// Tiles `[start, end]` with windows of `window_days` days. The last window
/// is shortened so it ends exactly at `end`.
pub fn slice_by_fixed_window(
    start: NaiveDateTime,
    end: NaiveDateTime,
    window_days: u32,
) -> Result<Vec<TimeSlice>, SliceError> {
    if start > end {
        return Err(SliceError::InvertedRange { start, end });
    }
    if window_days == 0 {
        return Err(SliceError::ZeroWindow);
    }
    if start == end {
        return Ok(vec![TimeSlice::new(start, end)]);
    }

    let window = TimeDelta::days(i64::from(window_days));
    let mut slices = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let next = cursor
            .checked_add_signed(window)
            .map_or(end, |next| next.min(end));
        slices.push(TimeSlice::new(cursor, next));
        cursor = next;
    }
    Ok(slices)
}

/// One slice per calendar year touched by `[start, end]`, each running from
/// `YYYY-01-01 00:00` to `YYYY-12-31 23:59` and clipped to the input range.
pub fn slice_by_calendar_year(
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<TimeSlice>, SliceError> {
    if start > end {
        return Err(SliceError::InvertedRange { start, end });
    }

    let mut slices = Vec::new();
    for year in start.year()..=end.year() {
        let year_start = first_of_month(year, 1)?;
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31)
            .and_then(|date| date.and_hms_opt(23, 59, 0))
            .ok_or(SliceError::DateOverflow(year))?;
        let slice_start = start.max(year_start);
        let slice_end = end.min(year_end);
        // Sub-minute remainders past 23:59 have nothing left to request.
        if slice_start <= slice_end {
            slices.push(TimeSlice::new(slice_start, slice_end));
        }
    }
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::time_range::parse_timestamp;

    fn ts(value: &str) -> NaiveDateTime {
        parse_timestamp(value).unwrap()
    }

    fn texts(slices: &[TimeSlice]) -> Vec<String> {
        slices.iter().map(TimeSlice::to_string).collect()
    }

    /// Slices are ordered, contiguous and cover exactly `[start, end]`.
    fn assert_covers(slices: &[TimeSlice], start: NaiveDateTime, end: NaiveDateTime) {
        assert!(!slices.is_empty(), "no slices for {start} - {end}");
        assert_eq!(slices[0].start, start);
        assert_eq!(slices[slices.len() - 1].end, end);
        for slice in slices {
            assert!(slice.start <= slice.end, "inverted slice {slice}");
        }
        for pair in slices.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "gap or overlap at {}", pair[0]);
            assert!(pair[0].start < pair[0].end, "empty slice {}", pair[0]);
        }
    }

    #[test]
    fn test_calendar_year_scenario() -> Result<(), SliceError> {
        let slices = slice_by_calendar_year(ts("2019-06-15 00:00"), ts("2021-03-01 00:00"))?;
        assert_eq!(
            texts(&slices),
            [
                "2019-06-15 00:00 - 2019-12-31 23:59",
                "2020-01-01 00:00 - 2020-12-31 23:59",
                "2021-01-01 00:00 - 2021-03-01 00:00",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_calendar_year_within_one_year() -> Result<(), SliceError> {
        let slices = slice_by_calendar_year(ts("2020-02-01 06:00"), ts("2020-02-03 00:00"))?;
        assert_eq!(texts(&slices), ["2020-02-01 06:00 - 2020-02-03 00:00"]);
        Ok(())
    }

    #[test]
    fn test_calendar_year_reconstructs_range() -> Result<(), SliceError> {
        let cases = [
            ("2015-01-01 00:00", "2015-12-31 23:59"),
            ("2011-03-01 00:00", "2024-07-15 13:00"),
            ("1999-12-31 23:00", "2000-01-01 01:00"),
            ("2020-05-05 05:05", "2020-05-05 05:05"),
        ];
        for (start, end) in cases {
            let (start, end) = (ts(start), ts(end));
            let slices = slice_by_calendar_year(start, end)?;
            assert_eq!(slices[0].start, start);
            assert_eq!(slices[slices.len() - 1].end, end);
            for pair in slices.windows(2) {
                // Years meet at 23:59 -> 00:00 of the next day.
                assert_eq!(pair[1].start - pair[0].end, TimeDelta::minutes(1));
                assert_eq!(pair[1].start.year(), pair[0].end.year() + 1);
            }
        }
        Ok(())
    }

    #[test]
    fn test_months_for_past_year() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2020)
            .reference_now(ts("2024-05-02 09:30"))
            .call()?;
        assert_eq!(
            texts(&slices),
            [
                "2020-01-01 00:00 - 2020-03-01 00:00",
                "2020-03-01 00:00 - 2020-05-01 00:00",
                "2020-05-01 00:00 - 2020-07-01 00:00",
                "2020-07-01 00:00 - 2020-09-01 00:00",
                "2020-09-01 00:00 - 2020-11-01 00:00",
                "2020-11-01 00:00 - 2021-01-01 00:00",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_months_clipped_to_now() -> Result<(), SliceError> {
        let now = ts("2020-07-15 13:27");
        let slices = slice_by_calendar_months()
            .year(2020)
            .reference_now(now)
            .call()?;
        assert_eq!(slices.len(), 4);
        assert_eq!(
            slices[3].to_string(),
            "2020-07-01 00:00 - 2020-07-15 13:00"
        );
        assert!(slices.iter().all(|slice| slice.end <= now));
        assert_covers(&slices, ts("2020-01-01 00:00"), ts("2020-07-15 13:00"));
        Ok(())
    }

    #[test]
    fn test_months_for_future_year_are_empty() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2021)
            .reference_now(ts("2020-07-15 13:27"))
            .call()?;
        assert!(slices.is_empty());
        Ok(())
    }

    #[test]
    fn test_months_respect_data_floor() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2011)
            .earliest_allowed(ts("2011-03-01 00:00"))
            .reference_now(ts("2024-01-01 00:00"))
            .call()?;
        assert_eq!(slices.len(), 5);
        assert_covers(&slices, ts("2011-03-01 00:00"), ts("2012-01-01 00:00"));

        let mid_window = slice_by_calendar_months()
            .year(2011)
            .earliest_allowed(ts("2011-03-15 00:00"))
            .reference_now(ts("2024-01-01 00:00"))
            .call()?;
        assert_eq!(
            mid_window[0].to_string(),
            "2011-03-15 00:00 - 2011-05-01 00:00"
        );
        assert_covers(&mid_window, ts("2011-03-15 00:00"), ts("2012-01-01 00:00"));
        Ok(())
    }

    #[test]
    fn test_months_partial_year() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2018)
            .first_month(5)
            .last_month(8)
            .max_months(3)
            .reference_now(ts("2024-01-01 00:00"))
            .call()?;
        assert_eq!(
            texts(&slices),
            [
                "2018-05-01 00:00 - 2018-08-01 00:00",
                "2018-08-01 00:00 - 2018-09-01 00:00",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_max_days_splits_each_month_in_two() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2020)
            .last_month(2)
            .max_days(10)
            .reference_now(ts("2024-01-01 00:00"))
            .call()?;
        assert_eq!(
            texts(&slices),
            [
                "2020-01-01 00:00 - 2020-01-11 00:00",
                "2020-01-11 00:00 - 2020-02-01 00:00",
                "2020-02-01 00:00 - 2020-02-11 00:00",
                "2020-02-11 00:00 - 2020-03-01 00:00",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_max_days_clipped_to_now() -> Result<(), SliceError> {
        let now = ts("2020-03-05 10:10");
        let slices = slice_by_calendar_months()
            .year(2020)
            .max_days(10)
            .reference_now(now)
            .call()?;
        assert_eq!(
            slices.last().map(TimeSlice::to_string).as_deref(),
            Some("2020-03-01 00:00 - 2020-03-05 10:00")
        );
        assert!(slices.iter().all(|slice| slice.end <= now));
        assert_covers(&slices, ts("2020-01-01 00:00"), ts("2020-03-05 10:00"));
        Ok(())
    }

    #[test]
    fn test_max_days_longer_than_month() -> Result<(), SliceError> {
        let slices = slice_by_calendar_months()
            .year(2020)
            .first_month(2)
            .last_month(2)
            .max_days(40)
            .reference_now(ts("2024-01-01 00:00"))
            .call()?;
        assert_eq!(texts(&slices), ["2020-02-01 00:00 - 2020-03-01 00:00"]);
        Ok(())
    }

    #[test]
    fn test_months_cover_every_configuration() -> Result<(), SliceError> {
        let now = ts("2030-01-01 00:00");
        for max_months in 1..=12 {
            for first_month in 1..=12 {
                let slices = slice_by_calendar_months()
                    .year(2016)
                    .first_month(first_month)
                    .max_months(max_months)
                    .reference_now(now)
                    .call()?;
                assert_covers(
                    &slices,
                    first_of_month(2016, first_month)?,
                    ts("2017-01-01 00:00"),
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_invalid_month_arguments() {
        let now = ts("2024-01-01 00:00");
        assert!(matches!(
            slice_by_calendar_months().year(2020).first_month(0).reference_now(now).call(),
            Err(SliceError::InvalidMonth(0))
        ));
        assert!(matches!(
            slice_by_calendar_months().year(2020).last_month(13).reference_now(now).call(),
            Err(SliceError::InvalidMonth(13))
        ));
        assert!(matches!(
            slice_by_calendar_months()
                .year(2020)
                .first_month(6)
                .last_month(3)
                .reference_now(now)
                .call(),
            Err(SliceError::MonthOrder { first: 6, last: 3 })
        ));
        assert!(matches!(
            slice_by_calendar_months().year(2020).max_months(0).reference_now(now).call(),
            Err(SliceError::ZeroMaxMonths)
        ));
        assert!(matches!(
            slice_by_calendar_months().year(2020).max_days(0).reference_now(now).call(),
            Err(SliceError::ZeroWindow)
        ));
    }

    #[test]
    fn test_fixed_window_never_overshoots() -> Result<(), SliceError> {
        let (start, end) = (ts("2020-01-01 00:00"), ts("2020-01-03 12:00"));
        let slices = slice_by_fixed_window(start, end, 1)?;
        assert_eq!(
            texts(&slices),
            [
                "2020-01-01 00:00 - 2020-01-02 00:00",
                "2020-01-02 00:00 - 2020-01-03 00:00",
                "2020-01-03 00:00 - 2020-01-03 12:00",
            ]
        );
        assert_covers(&slices, start, end);

        let weekly = slice_by_fixed_window(start, end, 7)?;
        assert_eq!(texts(&weekly), ["2020-01-01 00:00 - 2020-01-03 12:00"]);
        Ok(())
    }

    #[test]
    fn test_fixed_window_reconstructs_range() -> Result<(), SliceError> {
        let start = ts("2019-12-30 06:00");
        for days in [1, 2, 5, 30] {
            for hours in [1, 23, 24, 240, 1000] {
                let end = start + TimeDelta::hours(hours);
                let slices = slice_by_fixed_window(start, end, days)?;
                assert_covers(&slices, start, end);
            }
        }
        Ok(())
    }

    #[test]
    fn test_fixed_window_edge_cases() {
        let start = ts("2020-01-01 00:00");
        let single = slice_by_fixed_window(start, start, 1).unwrap();
        assert_eq!(single, [TimeSlice::new(start, start)]);
        assert!(matches!(
            slice_by_fixed_window(start, start, 0),
            Err(SliceError::ZeroWindow)
        ));
        assert!(matches!(
            slice_by_fixed_window(ts("2020-01-02 00:00"), start, 1),
            Err(SliceError::InvertedRange { .. })
        ));
        assert!(matches!(
            slice_by_calendar_year(ts("2020-01-02 00:00"), start),
            Err(SliceError::InvertedRange { .. })
        ));
    }
}
