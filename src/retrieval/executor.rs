use crate::planning::request_item::RequestItem;
use crate::retrieval::error::{BatchError, RetrieveError};
use crate::retrieval::outcome::{BatchReport, DownloadOutcome};
use crate::retrieval::retriever::Retriever;
use crate::retrieval::transport::Transport;
use crate::utils::resolve_worker_count;
use bon::bon;
use futures_util::{stream, StreamExt};
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Runs a list of [`RequestItem`]s, one after another or on a bounded pool.
pub struct BatchExecutor<T: Transport> {
    retriever: Arc<Retriever<T>>,
    parallel: bool,
    max_workers: usize,
    overwrite: bool,
    abort_on_failure: bool,
    cancellation_token: CancellationToken,
}

#[bon]
impl<T: Transport + 'static> BatchExecutor<T> {
    #[builder]
    pub fn new(
        #[builder(start_fn)] retriever: Arc<Retriever<T>>,
        #[builder(default)] parallel: bool,
        #[builder(default = DEFAULT_MAX_WORKERS)] max_workers: usize,
        #[builder(default)] overwrite: bool,
        #[builder(default)] abort_on_failure: bool,
        #[builder(default)] cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            retriever,
            parallel,
            max_workers,
            overwrite,
            abort_on_failure,
            cancellation_token,
        }
    }
}

impl<T: Transport + 'static> BatchExecutor<T> {
    /// Cancelling this token makes every not-yet-started item [`DownloadOutcome::Cancelled`].
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn worker_count(&self) -> usize {
        if self.parallel {
            resolve_worker_count(self.max_workers)
        } else {
            1
        }
    }

    /// Executes `items` and returns their outcomes in submission order.
    ///
    /// A rejected request or a local I/O error aborts the batch. Items that
    /// are already running finish, nothing new is started, and the first
    /// such error is returned.
    pub async fn run(&self, items: &[RequestItem]) -> Result<BatchReport, BatchError> {
        info!(
            "Running {} request(s) with {} worker(s)",
            items.len(),
            self.worker_count()
        );
        // Aborting must not cancel the caller's token, only this run.
        let run_token = self.cancellation_token.child_token();
        let report = if self.parallel {
            self.run_parallel(items, &run_token).await?
        } else {
            self.run_sequential(items, &run_token).await?
        };
        info!("Batch finished: {}", report);
        Ok(report)
    }

    async fn run_sequential(
        &self,
        items: &[RequestItem],
        token: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let outcome = fetch_one(
                Arc::clone(&self.retriever),
                item.clone(),
                self.overwrite,
                token.clone(),
            )
            .await
            .map_err(|source| BatchError::Aborted {
                index,
                url: item.url.clone(),
                source,
            })?;
            self.note_failure(&outcome, token);
            outcomes.push(outcome);
        }
        Ok(BatchReport { outcomes })
    }

    async fn run_parallel(
        &self,
        items: &[RequestItem],
        token: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let overwrite = self.overwrite;
        let mut slots: Vec<Option<DownloadOutcome>> = vec![None; items.len()];
        let mut first_error: Option<BatchError> = None;

        let mut results = stream::iter(items.iter().cloned().enumerate())
            .map(|(index, item)| {
                let retriever = Arc::clone(&self.retriever);
                let token = token.clone();
                async move {
                    let url = item.url.clone();
                    let joined =
                        tokio::spawn(fetch_one(retriever, item, overwrite, token)).await;
                    (index, url, joined)
                }
            })
            .buffer_unordered(self.worker_count());

        while let Some((index, url, joined)) = results.next().await {
            match joined.map_err(RetrieveError::from).and_then(|r| r) {
                Ok(outcome) => {
                    self.note_failure(&outcome, token);
                    slots[index] = Some(outcome);
                }
                Err(source) => {
                    warn!("Aborting batch after item {} ({}): {}", index, url, source);
                    token.cancel();
                    if first_error.is_none() {
                        first_error = Some(BatchError::Aborted { index, url, source });
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }
        let outcomes = slots
            .into_iter()
            .zip(items)
            .map(|(slot, item)| {
                slot.unwrap_or_else(|| DownloadOutcome::Cancelled {
                    path: item.destination.clone(),
                })
            })
            .collect();
        Ok(BatchReport { outcomes })
    }

    fn note_failure(&self, outcome: &DownloadOutcome, token: &CancellationToken) {
        if self.abort_on_failure && outcome.is_failure() && !token.is_cancelled() {
            warn!(
                "{} failed, not starting the remaining requests",
                outcome.path().display()
            );
            token.cancel();
        }
    }
}

async fn fetch_one<T: Transport>(
    retriever: Arc<Retriever<T>>,
    item: RequestItem,
    overwrite: bool,
    token: CancellationToken,
) -> Result<DownloadOutcome, RetrieveError> {
    if token.is_cancelled() {
        return Ok(DownloadOutcome::Cancelled {
            path: item.destination,
        });
    }
    retriever.fetch(&item, overwrite).await
}
