//! Turning a query and a time range into concrete (URL, file) pairs.

pub mod error;
pub mod planner;
pub mod request_item;
