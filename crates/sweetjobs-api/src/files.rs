//! Uploaded file storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Invalid upload path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Stores uploads and hands back the URL they are served from.
///
/// The URL is stored on the parent row as-is.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, directory: &str, upload: Upload) -> Result<String, FileStoreError>;
}

/// Writes uploads below a local directory that is served statically.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Only plain relative segments are allowed.
fn check_directory(directory: &str) -> Result<(), FileStoreError> {
    let path = Path::new(directory);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if directory.is_empty() || !plain {
        return Err(FileStoreError::InvalidPath(directory.to_string()));
    }
    Ok(())
}

/// Last path segment with anything outside `[A-Za-z0-9._-]` replaced.
fn sanitize_file_name(name: &str) -> Result<String, FileStoreError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(FileStoreError::InvalidPath(name.to_string()));
    }
    Ok(cleaned)
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, directory: &str, upload: Upload) -> Result<String, FileStoreError> {
        check_directory(directory)?;
        let file_name = sanitize_file_name(&upload.file_name)?;

        let target_dir = self.root.join(directory);
        tokio::fs::create_dir_all(&target_dir).await?;
        tokio::fs::write(target_dir.join(&file_name), &upload.bytes).await?;

        info!(
            directory,
            file_name = %file_name,
            size = upload.bytes.len(),
            "Stored upload"
        );
        Ok(format!("{}/{}/{}", self.public_base_url, directory, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.to_string(),
            bytes: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "http://localhost:8000/");

        let url = store.store("users/1/jobs/2", upload("logo.png")).await.unwrap();

        assert_eq!(url, "http://localhost:8000/users/1/jobs/2/logo.png");
        let written = std::fs::read(dir.path().join("users/1/jobs/2/logo.png")).unwrap();
        assert_eq!(written, b"png");
    }

    #[tokio::test]
    async fn test_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "http://localhost:8000");

        let err = store.store("../etc", upload("logo.png")).await.unwrap_err();
        assert!(matches!(err, FileStoreError::InvalidPath(_)));
        let err = store.store("users/1", upload("..")).await.unwrap_err();
        assert!(matches!(err, FileStoreError::InvalidPath(_)));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("C:\\tmp\\my logo.png").unwrap(), "my_logo.png");
        assert_eq!(sanitize_file_name("../../a.png").unwrap(), "a.png");
    }
}
