//! Backing-file bootstrap
//!
//! Creates an empty collection file the first time a collection is opened.

use crate::error::{Error, Result};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Contents of a freshly bootstrapped collection
pub const EMPTY_COLLECTION: &str = "[]";

/// Ensure a collection file exists at `path`.
///
/// Creates missing parent directories and writes an empty JSON array. An
/// existing file is left untouched and its contents are not validated.
/// Returns `true` when a new file was created.
pub async fn ensure_exists(path: &Path) -> Result<bool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::StorageUnavailable(format!(
                    "cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    // create_new keeps two racing bootstraps from truncating each other
    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(Error::StorageUnavailable(format!(
                "cannot create {}: {}",
                path.display(),
                e
            )))
        }
    };

    write_empty(path, &mut file).await?;
    tracing::info!("Created empty collection at {}", path.display());
    Ok(true)
}

/// Write the empty array into a just-created file.
///
/// On failure the file is removed again so a later bootstrap can retry
/// instead of finding a truncated collection.
async fn write_empty<W>(path: &Path, file: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(EMPTY_COLLECTION.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(path).await;
        return Err(Error::StorageUnavailable(format!(
            "cannot initialize {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;

    /// Writer whose every write fails, as on a full disk
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memos.json");
        std::fs::write(&path, "").unwrap();

        let err = write_empty(&path, &mut FullDisk).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert!(!path.exists());

        // the next bootstrap starts over
        assert!(ensure_exists(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_creates_empty_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("memos.json");

        assert!(ensure_exists(&path).await.unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[]");
    }

    #[tokio::test]
    async fn test_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");

        assert!(ensure_exists(&path).await.unwrap());
        assert!(!ensure_exists(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_existing_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memos.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(!ensure_exists(&path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json at all");
    }
}
