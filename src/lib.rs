//! # ClassHub
//!
//! Role-based collaboration platform for academic classes. Superusers
//! own classes and appoint per-class PMA admins; common users create
//! projects, exchange documents, and discuss them. The authorization
//! rules and the membership-consistency model live in the workspace
//! crates; this crate wires them together and exposes the service
//! facade.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use classhub::{ClassHub, RegisterUserRequest, RequestContext};
//!
//! let hub = ClassHub::in_memory();
//!
//! let alice = hub
//!     .users
//!     .register(RegisterUserRequest {
//!         username: "alice".to_string(),
//!         email: Some("alice@example.edu".to_string()),
//!         display_name: None,
//!         computing_id: None,
//!     })
//!     .await?;
//!
//! let ctx = RequestContext::for_user(&alice);
//! let mine = hub.projects.my_projects(&ctx).await?;
//! ```

pub mod hub;
pub mod telemetry;

pub use classhub_auth::Actor;
pub use classhub_core::config::AppConfig;
pub use classhub_core::error::{AppError, ErrorKind};
pub use classhub_core::types::session::SessionViews;
pub use classhub_entity::{class, document, project, user};
pub use classhub_service::{
    ClassService, CreateClassRequest, CreateProjectRequest, DocumentService, EngagementService,
    MembershipService, ProjectService, RegisterUserRequest, RequestContext, SearchService,
    UpdateProfileRequest, UploadDocumentRequest, UserService,
};

pub use hub::ClassHub;
pub use telemetry::init_tracing;
