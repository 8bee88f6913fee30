pub mod dataset;
pub mod error;
pub mod query;
pub mod saved_query;
pub mod station;
pub mod time_range;
