//! # classhub-auth
//!
//! The authorization engine for ClassHub. Every rule deciding who may
//! create, own, modify, join, or delete an entity lives here as a pure
//! function of an [`Actor`] snapshot and the minimal entity context —
//! no I/O, no side effects, no persistence dependencies.
//!
//! ## Modules
//!
//! - `actor` — the policy-facing snapshot of a principal
//! - `policy` — the decision predicates consulted by every mutating
//!   service entry point (and re-checked inside the store backends for
//!   the save-time rules)

pub mod actor;
pub mod policy;

pub use actor::Actor;
