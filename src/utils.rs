use crate::error::DataHubError;
use log::info;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

/// Reads an access token from a text file, trimming surrounding whitespace.
pub async fn read_token(path: &Path) -> Result<String, DataHubError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataHubError::TokenRead(path.to_path_buf(), e))?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(DataHubError::EmptyToken(path.to_path_buf()));
    }
    Ok(token.to_string())
}

pub async fn ensure_dir_exists(path: &Path) -> Result<(), DataHubError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(DataHubError::OutputNotDirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| DataHubError::OutputDirCreation(path.to_path_buf(), e))?;
            Ok(())
        }
        Err(e) => Err(DataHubError::OutputDirCreation(path.to_path_buf(), e)),
    }
}

/// Number of parallel download workers: `max_workers`, capped at one less
/// than the available cores, never below one.
pub fn resolve_worker_count(max_workers: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    max_workers.min(cores.saturating_sub(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_token_trims() -> Result<(), DataHubError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.txt");
        std::fs::write(&path, "  abc123 \n").unwrap();
        assert_eq!(read_token(&path).await?, "abc123");
        Ok(())
    }

    #[tokio::test]
    async fn test_read_token_errors() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "\n").unwrap();
        assert!(matches!(
            read_token(&empty).await,
            Err(DataHubError::EmptyToken(_))
        ));
        assert!(matches!(
            read_token(&dir.path().join("missing.txt")).await,
            Err(DataHubError::TokenRead(_, _))
        ));
    }

    #[tokio::test]
    async fn test_ensure_dir_exists() -> Result<(), DataHubError> {
        let dir = tempdir().unwrap();
        let target = dir.path().join("a/b");
        ensure_dir_exists(&target).await?;
        assert!(target.is_dir());
        // Second call is a no-op.
        ensure_dir_exists(&target).await?;

        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file).await,
            Err(DataHubError::OutputNotDirectory(_))
        ));
        Ok(())
    }

    #[test]
    fn test_worker_count_bounds() {
        assert_eq!(resolve_worker_count(0), 1);
        assert_eq!(resolve_worker_count(1), 1);
        let cores = std::thread::available_parallelism().unwrap().get();
        let expected = 5.min(cores.saturating_sub(1)).max(1);
        assert_eq!(resolve_worker_count(5), expected);
    }
}
