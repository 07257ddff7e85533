//! In-memory blob store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::traits::blob::BlobStore;

/// Blob store held entirely in process memory.
///
/// Pairs with the in-memory database backend for tests and embedded
/// deployments. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    /// Create an empty in-memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<String> {
        debug!(key, bytes = data.len(), "stored blob");
        self.blobs.insert(key.to_string(), data);
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> bool {
        self.blobs.remove(key);
        true
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.blobs.contains_key(key))
    }

    async fn read_bytes(&self, key: &str) -> AppResult<Bytes> {
        self.blobs
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Blob not found: {key}")))
    }
}
