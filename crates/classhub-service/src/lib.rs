//! # classhub-service
//!
//! Business logic service layer for ClassHub. Each service orchestrates
//! store backends, the blob store, and the authorization policy to
//! implement application-level use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references, so every service is cheap
//! to clone and safe to share across tasks.

pub mod class;
pub mod context;
pub mod document;
pub mod project;
pub mod user;

pub use class::{ClassService, CreateClassRequest};
pub use context::RequestContext;
pub use document::{DocumentService, EngagementService, SearchService, UploadDocumentRequest};
pub use project::{CreateProjectRequest, MembershipService, ProjectService};
pub use user::{RegisterUserRequest, UpdateProfileRequest, UserService};
