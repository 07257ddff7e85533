//! User account self-service and provisioning.

pub mod service;

pub use service::{RegisterUserRequest, UpdateProfileRequest, UserService};
