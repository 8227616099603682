//! File helpers for the transfer executor

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::transfers::TransferError;

/// Highest numeric suffix tried before giving up
const MAX_SUFFIX: u32 = 1000;

/// Pick a destination that does not overwrite anything
///
/// Returns `original` when it is free, otherwise the first free
/// `name_1.ext`, `name_2.ext`, ... Paths in `reserved` (destinations of other
/// pending receives) count as taken.
pub async fn unique_destination(original: &Path, reserved: &[PathBuf]) -> Result<PathBuf, TransferError> {
    if is_free(original, reserved).await {
        return Ok(original.to_path_buf());
    }

    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = original.extension().and_then(|s| s.to_str());

    for i in 1..MAX_SUFFIX {
        let new_name = match extension {
            Some(ext) => format!("{}_{}.{}", stem, i, ext),
            None => format!("{}_{}", stem, i),
        };
        let candidate = original.with_file_name(new_name);

        if is_free(&candidate, reserved).await {
            return Ok(candidate);
        }
    }

    Err(TransferError::Io(format!(
        "no free file name for {}",
        original.display()
    )))
}

async fn is_free(path: &Path, reserved: &[PathBuf]) -> bool {
    tokio::fs::metadata(path).await.is_err() && !reserved.iter().any(|r| r == path)
}

/// Delete a partially received file
pub async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove partial file {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_free_path_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        assert_eq!(unique_destination(&path, &[]).await.unwrap(), path);
    }

    #[tokio::test]
    async fn test_successive_collisions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");

        std::fs::write(&path, b"1").unwrap();
        let first = unique_destination(&path, &[]).await.unwrap();
        assert_eq!(first, dir.path().join("photo_1.jpg"));

        std::fs::write(&first, b"2").unwrap();
        let second = unique_destination(&path, &[]).await.unwrap();
        assert_eq!(second, dir.path().join("photo_2.jpg"));
    }

    #[tokio::test]
    async fn test_no_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("README");
        std::fs::write(&path, b"1").unwrap();

        assert_eq!(
            unique_destination(&path, &[]).await.unwrap(),
            dir.path().join("README_1")
        );
    }

    #[tokio::test]
    async fn test_reserved_paths_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        let reserved = vec![path.clone(), dir.path().join("photo_1.jpg")];

        assert_eq!(
            unique_destination(&path, &reserved).await.unwrap(),
            dir.path().join("photo_2.jpg")
        );
    }

    #[tokio::test]
    async fn test_remove_partial_ignores_missing() {
        let dir = TempDir::new().unwrap();
        remove_partial(&dir.path().join("missing")).await;

        let path = dir.path().join("partial");
        std::fs::write(&path, b"x").unwrap();
        remove_partial(&path).await;
        assert!(!path.exists());
    }
}
