//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::year::AcademicYear;

/// A registered user in the ClassHub system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Whether this user may own classes. Granted only through the
    /// superuser-provisioning path, never through profile updates.
    pub is_superuser: bool,
    /// Materialized role label; kept in sync with class admin sets.
    pub role: UserRole,
    /// University computing id (unique when present).
    pub computing_id: Option<String>,
    /// Declared major.
    pub major: Option<String>,
    /// Academic year.
    pub year: Option<AcademicYear>,
    /// Free-form bio.
    pub bio: Option<String>,
    /// Blob key of the current profile picture.
    pub avatar_key: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if this user currently carries the PMA-admin label.
    pub fn is_pma_admin(&self) -> bool {
        self.role.is_pma_admin()
    }

    /// Check if this user is the anonymous guest.
    pub fn is_anonymous(&self) -> bool {
        self.role.is_anonymous()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// Whether the new user is a superuser. Only the provisioning path
    /// sets this.
    pub is_superuser: bool,
    /// University computing id (optional).
    pub computing_id: Option<String>,
}

/// Data for updating an existing user's profile.
///
/// Every profile field is replaced wholesale; `None` clears the field.
/// Role and superuser standing are not writable through this payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfile {
    /// The user ID to update.
    pub id: Uuid,
    /// New email address.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
    /// New computing id.
    pub computing_id: Option<String>,
    /// New major.
    pub major: Option<String>,
    /// New academic year.
    pub year: Option<AcademicYear>,
    /// New bio.
    pub bio: Option<String>,
}

/// A materialized role label written for one user during an admin-set
/// mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    /// The user whose label changed.
    pub user_id: Uuid,
    /// The label now on record.
    pub role: UserRole,
}
