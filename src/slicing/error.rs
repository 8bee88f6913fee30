use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("Slice range starts at {start} which is after its end {end}")]
    InvertedRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Month {0} is outside 1..=12")]
    InvalidMonth(u32),

    #[error("First month {first} comes after last month {last}")]
    MonthOrder { first: u32, last: u32 },

    #[error("Slices must span at least one month")]
    ZeroMaxMonths,

    #[error("Slices must span at least one day")]
    ZeroWindow,

    #[error("Calendar arithmetic overflowed for year {0}")]
    DateOverflow(i32),
}
