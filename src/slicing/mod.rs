//! Cutting requested time ranges into pieces the data hub accepts in one request.

pub mod error;
pub mod slicer;
