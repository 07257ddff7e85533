//! # classhub-core
//!
//! Core crate for ClassHub. Contains the blob-store trait, configuration
//! schemas, session-scoped view tracking, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ClassHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
