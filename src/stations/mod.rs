//! Station metadata published by the hub.

pub mod catalog;
pub mod error;
