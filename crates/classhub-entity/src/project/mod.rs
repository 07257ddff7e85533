//! Project domain entities.

pub mod comment;
pub mod join_request;
pub mod model;

pub use comment::{CreateProjectComment, ProjectComment};
pub use join_request::{JoinOutcome, JoinRequest};
pub use model::{CreateProject, Project, ProjectDeletion};
