//! The main entry point: configure once, then plan, download and merge
//! datasets from the data hub.

use crate::error::DataHubError;
use crate::merging::merger::{CdoMergeTool, MergeOutcome, YearMerger, DEFAULT_MERGE_PROGRAM};
use crate::planning::planner::RequestPlanner;
use crate::planning::request_item::RequestItem;
use crate::retrieval::executor::{BatchExecutor, DEFAULT_MAX_WORKERS};
use crate::retrieval::outcome::BatchReport;
use crate::retrieval::retriever::{Retriever, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_RETRIES};
use crate::retrieval::transport::{HttpTransport, Transport};
use crate::stations::catalog::StationCatalog;
use crate::types::dataset::{DatasetKind, DEFAULT_BASE_URL};
use crate::types::query::QuerySpec;
use crate::types::time_range::TimeRange;
use crate::utils::{ensure_dir_exists, read_token};
use bon::bon;
use chrono::NaiveDateTime;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Settings shared by every download and merge a [`DataHub`] performs.
///
/// # Examples
///
/// ```
/// use zamg_datahub::HubConfig;
/// use std::time::Duration;
///
/// let config = HubConfig::builder()
///     .output_dir("data/inca")
///     .parallel(true)
///     .max_workers(4)
///     .timeout(Duration::from_secs(300))
///     .build();
/// assert_eq!(config.max_retries(), 3);
/// assert!(config.token().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HubConfig {
    output_dir: PathBuf,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
    backoff_unit: Duration,
    timeout: Option<Duration>,
    parallel: bool,
    max_workers: usize,
    overwrite: bool,
    abort_on_failure: bool,
    merge_program: String,
    overwrite_merged: bool,
}

#[bon]
impl HubConfig {
    /// # Arguments
    ///
    /// * `.output_dir(..)`: **Required.** Root directory for downloaded files.
    /// * `.base_url(..)`: Optional. API root, defaults to [`DEFAULT_BASE_URL`].
    /// * `.token(..)`: Optional. Access token appended to every data URL.
    /// * `.max_retries(..)`: Optional. Extra attempts after a transient failure (default 3).
    /// * `.backoff_unit(..)`: Optional. The wait after attempt `n` is `n` times this (default 5 s).
    /// * `.timeout(..)`: Optional. Per-request timeout. No timeout when unset.
    /// * `.parallel(..)`: Optional. Download on a worker pool instead of one by one.
    /// * `.max_workers(..)`: Optional. Upper bound for the pool (default 5, never more than cores - 1).
    /// * `.overwrite(..)`: Optional. Download again files that already exist.
    /// * `.abort_on_failure(..)`: Optional. Stop after the first download that exhausts its retries.
    /// * `.merge_program(..)`: Optional. Path of the `cdo` binary used for merging.
    /// * `.overwrite_merged(..)`: Optional. Re-create yearly files that already exist.
    #[builder]
    pub fn new(
        #[builder(into)] output_dir: PathBuf,
        #[builder(into, default = DEFAULT_BASE_URL.to_string())] base_url: String,
        #[builder(into)] token: Option<String>,
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = DEFAULT_BACKOFF_UNIT)] backoff_unit: Duration,
        timeout: Option<Duration>,
        #[builder(default)] parallel: bool,
        #[builder(default = DEFAULT_MAX_WORKERS)] max_workers: usize,
        #[builder(default)] overwrite: bool,
        #[builder(default)] abort_on_failure: bool,
        #[builder(into, default = DEFAULT_MERGE_PROGRAM.to_string())] merge_program: String,
        #[builder(default)] overwrite_merged: bool,
    ) -> Self {
        Self {
            output_dir,
            base_url,
            token,
            max_retries,
            backoff_unit,
            timeout,
            parallel,
            max_workers,
            overwrite,
            abort_on_failure,
            merge_program,
            overwrite_merged,
        }
    }
}

impl HubConfig {
    /// Replaces the token with the trimmed contents of `path`.
    pub async fn with_token_file(mut self, path: impl AsRef<Path>) -> Result<Self, DataHubError> {
        self.token = Some(read_token(path.as_ref()).await?);
        Ok(self)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn abort_on_failure(&self) -> bool {
        self.abort_on_failure
    }

    pub fn merge_program(&self) -> &str {
        &self.merge_program
    }

    pub fn overwrite_merged(&self) -> bool {
        self.overwrite_merged
    }
}

/// Client for the data hub.
///
/// Holds the request planner, the retrying retriever and the merge tool. All
/// network access goes through the [`Transport`] `T`, which is a real HTTP
/// client unless a different one is supplied with [`DataHub::with_transport`].
///
/// # Examples
///
/// ```no_run
/// # use zamg_datahub::{BoundingBox, DataHub, DataHubError, DatasetKind, HubConfig, Location, QuerySpec, TimeRange};
/// # async fn run() -> Result<(), DataHubError> {
/// let hub = DataHub::new(HubConfig::builder().output_dir("data").build())?;
/// let query = QuerySpec::builder()
///     .dataset(DatasetKind::Spartacus)
///     .params(vec!["TN".to_string(), "TX".to_string()])
///     .location(Location::BoundingBox(BoundingBox {
///         lat_min: 46.3,
///         lon_min: 9.5,
///         lat_max: 49.0,
///         lon_max: 17.2,
///     }))
///     .location_label("austria")
///     .build()?;
/// let range = TimeRange::parse("2020-01-01 00:00", "2020-12-31 00:00")?;
///
/// let report = hub.download().query(&query).range(&range).call().await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct DataHub<T: Transport = HttpTransport> {
    config: HubConfig,
    planner: RequestPlanner,
    retriever: Arc<Retriever<T>>,
    merger: YearMerger<CdoMergeTool>,
    cancellation_token: CancellationToken,
}

impl DataHub<HttpTransport> {
    /// Creates a client that talks HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`DataHubError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: HubConfig) -> Result<Self, DataHubError> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

#[bon]
impl<T: Transport + 'static> DataHub<T> {
    pub fn with_transport(config: HubConfig, transport: T) -> Self {
        let planner = RequestPlanner::builder()
            .output_dir(config.output_dir.clone())
            .base_url(config.base_url.clone())
            .maybe_token(config.token.clone())
            .build();
        let retriever = Retriever::builder(transport)
            .max_retries(config.max_retries)
            .backoff_unit(config.backoff_unit)
            .build();
        let merger = YearMerger::new(CdoMergeTool::new(config.merge_program.clone()));
        Self {
            config,
            planner,
            retriever: Arc::new(retriever),
            merger,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Plans `query` over `range` and downloads every resulting file.
    ///
    /// Area and point datasets yield a single file. Station datasets yield one
    /// file per station, or one per station and calendar year when the query
    /// asks for annual slices. Files that already exist are kept unless the
    /// configuration enables overwriting.
    ///
    /// # Errors
    ///
    /// Planning errors ([`DataHubError::Plan`]) are raised before any request
    /// is sent. [`DataHubError::Batch`] means the hub rejected a request or a
    /// file could not be written. Transient failures do not error; they show
    /// up as failed outcomes in the returned [`BatchReport`].
    #[builder]
    pub async fn download(
        &self,
        query: &QuerySpec,
        range: &TimeRange,
    ) -> Result<BatchReport, DataHubError> {
        let items = self.planner.plan(query, range)?;
        info!(
            "Downloading {} from {} for {}: {} request(s)",
            query.dataset(),
            query.location_label(),
            range,
            items.len()
        );
        self.execute(&items).await
    }

    /// Downloads one calendar year of an area or point dataset as month-based
    /// slices, ready to be combined with [`DataHub::merge_year`].
    ///
    /// `reference_now` caps the last slice and defaults to the local clock.
    #[builder]
    pub async fn download_year(
        &self,
        query: &QuerySpec,
        year: i32,
        #[builder(default = 1)] first_month: u32,
        #[builder(default = 12)] last_month: u32,
        #[builder(default = 2)] max_months: u32,
        max_days: Option<u32>,
        reference_now: Option<NaiveDateTime>,
    ) -> Result<BatchReport, DataHubError> {
        let items = self
            .planner
            .plan_year()
            .query(query)
            .year(year)
            .first_month(first_month)
            .last_month(last_month)
            .max_months(max_months)
            .maybe_max_days(max_days)
            .maybe_reference_now(reference_now)
            .call()?;
        info!(
            "Downloading {} {} for {} in {} slice(s)",
            query.dataset(),
            year,
            query.location_label(),
            items.len()
        );
        self.execute(&items).await
    }
}

impl<T: Transport + 'static> DataHub<T> {
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn planner(&self) -> &RequestPlanner {
        &self.planner
    }

    pub fn transport(&self) -> &T {
        self.retriever.transport()
    }

    /// Cancel this token to stop any running download from starting further requests.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Downloads an already planned list of items, e.g. from
    /// [`RequestPlanner::plan_windows`].
    pub async fn execute(&self, items: &[RequestItem]) -> Result<BatchReport, DataHubError> {
        ensure_dir_exists(self.config.output_dir()).await?;
        let executor = BatchExecutor::builder(Arc::clone(&self.retriever))
            .parallel(self.config.parallel)
            .max_workers(self.config.max_workers)
            .overwrite(self.config.overwrite)
            .abort_on_failure(self.config.abort_on_failure)
            .cancellation_token(self.cancellation_token.clone())
            .build();
        Ok(executor.run(items).await?)
    }

    /// Merges the slice files of `year` found in `dir` into one yearly file.
    pub async fn merge_year(&self, dir: &Path, year: i32) -> Result<MergeOutcome, DataHubError> {
        Ok(self
            .merger
            .merge_year(dir, year, self.config.overwrite_merged)
            .await?)
    }

    pub async fn merge_years(
        &self,
        dir: &Path,
        years: impl IntoIterator<Item = i32>,
    ) -> Result<Vec<MergeOutcome>, DataHubError> {
        Ok(self
            .merger
            .merge_years(dir, years, self.config.overwrite_merged)
            .await?)
    }

    /// Fetches the list of stations for a station dataset.
    pub async fn station_catalog(&self, kind: DatasetKind) -> Result<StationCatalog, DataHubError> {
        Ok(StationCatalog::fetch(self.transport(), self.planner.base_url(), kind).await?)
    }

    /// Saves `query` as `{DATASET}_query_{label}.txt` in the output directory.
    pub async fn save_query(&self, query: &QuerySpec) -> Result<PathBuf, DataHubError> {
        ensure_dir_exists(self.config.output_dir()).await?;
        Ok(query.save(self.config.output_dir(), None).await?)
    }
}
