//! Class administration, rosters, and admin sets.

pub mod service;

pub use service::{ClassService, CreateClassRequest};
