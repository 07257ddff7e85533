//! Blob store trait for pluggable binary attachment backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for blob storage backends.
///
/// ClassHub treats binary attachments (document files, profile pictures)
/// as opaque blobs reachable by key. The [`BlobStore`] trait is defined
/// here in `classhub-core` and implemented in `classhub-storage`.
///
/// Deletion is deliberately non-throwing: record mutations that accompany
/// a blob deletion proceed even when the backend fails, so `delete`
/// reports success or failure as a boolean and implementations log the
/// underlying cause themselves.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "memory").
    fn provider_type(&self) -> &str;

    /// Store bytes under the given key, returning the stored locator.
    async fn put(&self, key: &str, data: Bytes) -> AppResult<String>;

    /// Delete the blob at the given key.
    ///
    /// Returns `true` when the blob is gone (deleted, or never existed),
    /// `false` when the backend failed to delete it.
    async fn delete(&self, key: &str) -> bool;

    /// Check whether a blob exists at the given key.
    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Read a blob into memory as a complete byte vector.
    async fn read_bytes(&self, key: &str) -> AppResult<Bytes>;
}
