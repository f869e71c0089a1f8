//! Blob storage for uploaded files.

use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return the handle it can be read back by.
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<String, StorageError>;

    async fn get(&self, handle: &str) -> Result<Vec<u8>, StorageError>;
}

/// Strip any directory components and reject names that are empty or
/// consist only of dots.
pub fn sanitize_filename(name: &str) -> Result<String, StorageError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(cleaned)
}

/// `<unix-millis>-<8 hex>-<name>`.
pub fn stored_name(original_name: &str) -> Result<String, StorageError> {
    let name = sanitize_filename(original_name)?;
    Ok(format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..8],
        name
    ))
}

pub fn ensure_dirs(upload_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)
}

/// Files under a single local directory. Handles are bare file names.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, handle: &str) -> Result<PathBuf, StorageError> {
        if handle.is_empty() || handle == "." || handle == ".." || handle.contains(['/', '\\']) {
            return Err(StorageError::InvalidName(handle.to_string()));
        }
        Ok(self.root.join(handle))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, original_name: &str, data: &[u8]) -> Result<String, StorageError> {
        let handle = stored_name(original_name)?;
        let path = self.resolve(&handle)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(handle)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
