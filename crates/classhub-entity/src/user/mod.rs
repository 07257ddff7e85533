//! User domain entities.

pub mod model;
pub mod role;
pub mod year;

pub use model::{CreateUser, RoleChange, UpdateProfile, User};
pub use role::UserRole;
pub use year::AcademicYear;
