//! In-memory storage backend.
//!
//! Implements every store trait behind a single mutex, which serializes
//! operations and makes the multi-step invariants (role recompute, join
//! approval, owner re-assertion, like toggling) trivially atomic. Used
//! by the test suite and by embedded deployments that do not want a
//! database.

mod state;
mod store;

pub use store::MemoryStore;
