use crate::planning::request_item::RequestItem;
use crate::retrieval::error::RetrieveError;
use crate::retrieval::outcome::DownloadOutcome;
use crate::retrieval::transport::Transport;
use bon::bon;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::{fs, task};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(5);

/// Fetches one [`RequestItem`] and stores its body at the item's destination.
pub struct Retriever<T: Transport> {
    transport: T,
    max_retries: u32,
    backoff_unit: Duration,
}

#[bon]
impl<T: Transport> Retriever<T> {
    /// Wraps a transport with retry behaviour.
    ///
    /// After the `n`-th failed attempt the retriever sleeps `n * backoff_unit`
    /// before trying again. At most `max_retries + 1` attempts are made.
    #[builder]
    pub fn new(
        #[builder(start_fn)] transport: T,
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = DEFAULT_BACKOFF_UNIT)] backoff_unit: Duration,
    ) -> Self {
        Self {
            transport,
            max_retries,
            backoff_unit,
        }
    }
}

impl<T: Transport> Retriever<T> {
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Downloads `item` unless its destination is already there.
    ///
    /// Transient failures are retried and finally reported as
    /// [`DownloadOutcome::Failed`]. A request the hub rejects outright, or a
    /// local filesystem problem, is returned as an error instead.
    pub async fn fetch(
        &self,
        item: &RequestItem,
        overwrite: bool,
    ) -> Result<DownloadOutcome, RetrieveError> {
        let path = item.destination.clone();
        if !overwrite {
            let exists = fs::try_exists(&path)
                .await
                .map_err(|e| RetrieveError::ExistenceCheck(path.clone(), e))?;
            if exists {
                info!("{} already exists, skipping", path.display());
                return Ok(DownloadOutcome::AlreadyPresent { path });
            }
        }

        let total_attempts = self.max_retries + 1;
        let mut last_error = String::new();
        for attempt in 1..=total_attempts {
            debug!("Requesting {} (attempt {}/{})", item, attempt, total_attempts);
            match self.transport.get(&item.url).await {
                Ok(body) => {
                    let bytes = body.len();
                    write_atomically(&path, body).await?;
                    info!("Saved {} ({} bytes)", path.display(), bytes);
                    return Ok(DownloadOutcome::Downloaded {
                        path,
                        bytes,
                        attempts: attempt,
                    });
                }
                Err(e) if !e.is_retryable() => {
                    warn!("Request for {} was rejected: {}", item, e);
                    return Err(RetrieveError::BadRequest {
                        url: item.url.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt, total_attempts, item, e
                    );
                    last_error = e.to_string();
                    if attempt < total_attempts {
                        tokio::time::sleep(self.backoff_unit * attempt).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on {} after {} attempts. Try requesting less data, e.g. fewer parameters or smaller time periods",
            item, total_attempts
        );
        Ok(DownloadOutcome::Failed {
            path,
            attempts: total_attempts,
            error: last_error,
        })
    }
}

/// Writes `body` to a temp file next to `path`, then renames it into place.
async fn write_atomically(path: &Path, body: Vec<u8>) -> Result<(), RetrieveError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .await
        .map_err(|e| RetrieveError::DirCreation(parent.clone(), e))?;

    let target = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| RetrieveError::FileWrite(target.clone(), e))?;
        temp_file
            .write_all(&body)
            .map_err(|e| RetrieveError::FileWrite(target.clone(), e))?;
        temp_file
            .flush()
            .map_err(|e| RetrieveError::FileWrite(target.clone(), e))?;
        temp_file
            .persist(&target)
            .map_err(|e| RetrieveError::FileWrite(target.clone(), e.error))?;
        Ok::<(), RetrieveError>(())
    })
    .await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::testing::{Scripted, ScriptedTransport};
    use reqwest::StatusCode;
    use tempfile::tempdir;

    fn retriever(transport: ScriptedTransport) -> Retriever<ScriptedTransport> {
        Retriever::builder(transport)
            .max_retries(3)
            .backoff_unit(Duration::from_millis(1))
            .build()
    }

    fn item(dir: &Path, name: &str) -> RequestItem {
        RequestItem::new(
            format!("https://hub.test/{}", name),
            dir.join(name),
            None,
        )
    }

    #[tokio::test]
    async fn test_downloads_and_creates_parent_dirs() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(&dir.path().join("nested/deeper"), "a.nc");
        let retriever = retriever(ScriptedTransport::new());

        let outcome = retriever.fetch(&item, false).await?;

        let expected = item.url.as_bytes().to_vec();
        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                path: item.destination.clone(),
                bytes: expected.len(),
                attempts: 1,
            }
        );
        assert_eq!(std::fs::read(&item.destination).unwrap(), expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_file_is_not_requested() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "present.nc");
        std::fs::write(&item.destination, b"old").unwrap();
        let retriever = retriever(ScriptedTransport::new());

        let outcome = retriever.fetch(&item, false).await?;

        assert_eq!(
            outcome,
            DownloadOutcome::AlreadyPresent {
                path: item.destination.clone()
            }
        );
        assert_eq!(retriever.transport().calls(), 0);
        assert_eq!(std::fs::read(&item.destination).unwrap(), b"old");
        Ok(())
    }

    #[tokio::test]
    async fn test_overwrite_replaces_existing_file() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "replace.nc");
        std::fs::write(&item.destination, b"old").unwrap();
        let transport = ScriptedTransport::new();
        transport.script(&item.url, vec![Scripted::Body(b"new".to_vec())]);
        let retriever = retriever(transport);

        let outcome = retriever.fetch(&item, true).await?;

        assert!(matches!(outcome, DownloadOutcome::Downloaded { bytes: 3, .. }));
        assert_eq!(std::fs::read(&item.destination).unwrap(), b"new");
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "flaky.nc");
        let transport = ScriptedTransport::new();
        transport.script(
            &item.url,
            vec![
                Scripted::Status(StatusCode::SERVICE_UNAVAILABLE),
                Scripted::Status(StatusCode::TOO_MANY_REQUESTS),
                Scripted::Body(b"ok".to_vec()),
            ],
        );
        let retriever = retriever(transport);

        let outcome = retriever.fetch(&item, false).await?;

        assert!(matches!(
            outcome,
            DownloadOutcome::Downloaded { attempts: 3, .. }
        ));
        assert_eq!(retriever.transport().calls_for(&item.url), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_success_on_last_allowed_attempt() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "late.nc");
        let transport = ScriptedTransport::new();
        let mut script = vec![Scripted::Status(StatusCode::SERVICE_UNAVAILABLE); 3];
        script.push(Scripted::Body(b"late".to_vec()));
        transport.script(&item.url, script);
        let retriever = retriever(transport);

        let outcome = retriever.fetch(&item, false).await?;

        assert!(matches!(
            outcome,
            DownloadOutcome::Downloaded { attempts: 4, bytes: 4, .. }
        ));
        assert_eq!(retriever.transport().calls_for(&item.url), 4);
        assert_eq!(std::fs::read(&item.destination).unwrap(), b"late");
        Ok(())
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_failure() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "down.nc");
        let transport = ScriptedTransport::new();
        transport.script(
            &item.url,
            vec![Scripted::Status(StatusCode::BAD_GATEWAY); 4],
        );
        let retriever = retriever(transport);

        let outcome = retriever.fetch(&item, false).await?;

        match outcome {
            DownloadOutcome::Failed { attempts, error, .. } => {
                assert_eq!(attempts, 4);
                assert!(error.contains("502"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(retriever.transport().calls(), 4);
        assert!(!item.destination.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "bad.nc");
        let transport = ScriptedTransport::new();
        transport.script(&item.url, vec![Scripted::Status(StatusCode::BAD_REQUEST)]);
        let retriever = retriever(transport);

        let result = retriever.fetch(&item, false).await;

        match result {
            Err(RetrieveError::BadRequest { url, .. }) => assert_eq!(url, item.url),
            other => panic!("expected bad request, got {:?}", other),
        }
        assert_eq!(retriever.transport().calls(), 1);
        assert!(!item.destination.exists());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() -> Result<(), RetrieveError> {
        let dir = tempdir().unwrap();
        let item = item(dir.path(), "clean.nc");
        retriever(ScriptedTransport::new()).fetch(&item, false).await?;

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("clean.nc")]);
        Ok(())
    }
}
