use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to a single [`RequestItem`](crate::RequestItem).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded {
        path: PathBuf,
        bytes: usize,
        attempts: u32,
    },
    /// The destination already existed and overwriting was off.
    AlreadyPresent { path: PathBuf },
    /// Every attempt failed with a retryable error.
    Failed {
        path: PathBuf,
        attempts: u32,
        error: String,
    },
    /// Never started because the batch was cancelled or aborted.
    Cancelled { path: PathBuf },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DownloadOutcome::Downloaded { path, .. }
            | DownloadOutcome::AlreadyPresent { path }
            | DownloadOutcome::Failed { path, .. }
            | DownloadOutcome::Cancelled { path } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// Outcomes of one batch run, index-aligned with the submitted items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Downloaded { .. }))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::AlreadyPresent { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(DownloadOutcome::is_failure)
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Cancelled { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// True when every item ended up on disk.
    pub fn is_complete(&self) -> bool {
        self.failed() == 0 && self.cancelled() == 0
    }

    fn count(&self, predicate: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} already present, {} failed, {} cancelled",
            self.downloaded(),
            self.already_present(),
            self.failed(),
            self.cancelled()
        )
    }
}
