//! Plan and download time-sliced climate datasets from the ZAMG / GeoSphere
//! Austria data hub.
//!
//! A [`QuerySpec`] names a dataset, its parameters and a location. The
//! [`RequestPlanner`] turns it plus a [`TimeRange`] into concrete
//! [`RequestItem`]s, a [`BatchExecutor`] downloads them with retries, and a
//! [`YearMerger`] can stitch the slices of one year back together. [`DataHub`]
//! wires all of that up from a single [`HubConfig`].

mod datahub;
mod error;
mod merging;
mod planning;
mod retrieval;
mod slicing;
mod stations;
mod types;
mod utils;

pub use datahub::*;
pub use error::DataHubError;

pub use types::dataset::*;
pub use types::error::QueryError;
pub use types::query::*;
pub use types::station::Station;
pub use types::time_range::*;

pub use slicing::error::SliceError;
pub use slicing::slicer::*;

pub use planning::error::PlanError;
pub use planning::planner::RequestPlanner;
pub use planning::request_item::RequestItem;

pub use retrieval::error::{BatchError, RetrieveError, TransportError};
pub use retrieval::executor::*;
pub use retrieval::outcome::*;
pub use retrieval::retriever::*;
pub use retrieval::transport::*;

pub use merging::error::MergeError;
pub use merging::merger::*;

pub use stations::catalog::StationCatalog;
pub use stations::error::CatalogError;

pub use utils::{read_token, resolve_worker_count};
