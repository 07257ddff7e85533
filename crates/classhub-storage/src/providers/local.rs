//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_core::traits::blob::BlobStore;

/// Blob store backed by a directory on the local filesystem.
///
/// Keys map to paths under the root. Keys are validated before use so a
/// crafted file name cannot reach outside the root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalFailure,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a key to an absolute path within the root, refusing keys
    /// that would escape it.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let clean = key.trim_start_matches('/');
        if clean.is_empty() {
            return Err(AppError::validation("blob key must not be empty"));
        }

        let relative = Path::new(clean);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    return Err(AppError::validation(format!(
                        "blob key escapes the storage root: {key}"
                    )));
                }
            }
        }

        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalFailure,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<String> {
        let full_path = self.resolve(key)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalFailure,
                format!("Failed to write blob: {key}"),
                e,
            )
        })?;

        debug!(key, bytes = data.len(), "wrote blob");
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> bool {
        let full_path = match self.resolve(key) {
            Ok(path) => path,
            Err(e) => {
                warn!(key, error = %e, "refusing to delete blob with invalid key");
                return false;
            }
        };

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "deleted blob");
                true
            }
            // A blob that never existed is as gone as a deleted one.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(key, error = %e, "failed to delete blob");
                false
            }
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let full_path = self.resolve(key)?;
        Ok(full_path.exists())
    }

    async fn read_bytes(&self, key: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(key)?;
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::ExternalFailure,
                    format!("Failed to read blob: {key}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }
}
