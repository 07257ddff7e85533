//! Database layer for ClassHub.
//!
//! Defines the store traits the service layer talks to, plus two backends:
//! PostgreSQL repositories built on `sqlx`, and a mutex-guarded in-memory
//! store for tests and embedded use. Connection pooling and migrations
//! live here as well.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{ClassStore, DocumentStore, ProjectStore, UserStore};
