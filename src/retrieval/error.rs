use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("Failed to read response body from {url}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Client errors mean the request itself is wrong and will fail again.
    /// Timeouts (408) and throttling (429) are the exception.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ClientBuild(_) => false,
            TransportError::HttpStatus { status, .. } => {
                !status.is_client_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            TransportError::Request { .. } | TransportError::Body { .. } => true,
        }
    }
}

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("Bad request, the data hub rejected {url}. Check parameters and time range")]
    BadRequest {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Failed to check for existing file '{0}'")]
    ExistenceCheck(PathBuf, #[source] std::io::Error),

    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to write downloaded file '{0}'")]
    FileWrite(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch aborted at item {index} ({url})")]
    Aborted {
        index: usize,
        url: String,
        #[source]
        source: RetrieveError,
    },
}
