//! Project lifecycle, membership, and discussion.

pub mod membership;
pub mod service;

pub use membership::MembershipService;
pub use service::{CreateProjectRequest, ProjectService};
