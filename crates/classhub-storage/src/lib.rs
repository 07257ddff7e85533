//! # classhub-storage
//!
//! Blob storage providers for ClassHub. Document files and profile
//! pictures are opaque blobs reachable by key; the providers here
//! implement the [`BlobStore`] trait from `classhub-core` against the
//! local filesystem and against process memory.
//!
//! [`BlobStore`]: classhub_core::traits::blob::BlobStore

pub mod providers;

pub use providers::local::LocalBlobStore;
pub use providers::memory::MemoryBlobStore;
