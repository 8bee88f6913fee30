//! Combining the per-slice files of one year into a single file.

pub mod error;
pub mod merger;
