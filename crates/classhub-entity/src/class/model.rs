//! Class entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::user::RoleChange;

/// A class: the top-level container grouping projects.
///
/// Classes are owned by superusers. The member set and the PMA-admin set
/// live in join tables and are loaded separately; a PMA admin need not be
/// a member.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    /// Unique class identifier.
    pub id: Uuid,
    /// The owning superuser.
    pub owner_id: Uuid,
    /// Unique enrollment code (e.g. `"CS3240-F24"`).
    pub code: String,
    /// Class name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// When the class was created.
    pub created_at: DateTime<Utc>,
    /// When the class was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClass {
    /// The owning superuser.
    pub owner_id: Uuid,
    /// Unique enrollment code.
    pub code: String,
    /// Class name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Outcome of replacing a class's PMA-admin set.
///
/// Role labels are rewritten in the same transaction as the set change,
/// so the changes reported here are already on record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSetUpdate {
    /// Users newly added to the admin set.
    pub added: Vec<Uuid>,
    /// Users removed from the admin set.
    pub removed: Vec<Uuid>,
    /// Role labels rewritten for the affected users.
    pub role_changes: Vec<RoleChange>,
}

impl AdminSetUpdate {
    /// Whether the mutation changed the set at all.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of deleting a class.
///
/// The row cascade is already committed when this is returned; the blob
/// keys are what the caller still has to clean up best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDeletion {
    /// Role labels rewritten for the class's former PMA admins.
    pub role_changes: Vec<RoleChange>,
    /// Storage keys of every document that went down with the class.
    pub blob_keys: Vec<String>,
}
