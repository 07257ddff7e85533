//! Core traits defined in `classhub-core` and implemented by other crates.

pub mod blob;

pub use blob::BlobStore;
