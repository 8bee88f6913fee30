//! Fetching planned requests: the transport seam, retries and the batch pool.

pub mod error;
pub mod executor;
pub mod outcome;
pub mod retriever;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
