//! Project entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A collaborative workspace within a class.
///
/// Owned by a common user (never a PMA admin of the owning class). The
/// member set lives in a join table and always contains the owner; every
/// membership mutation re-asserts that before committing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Unique project identifier.
    pub id: Uuid,
    /// The class this project belongs to.
    pub class_id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unique opaque storage-folder reference for the project's documents.
    pub folder_key: String,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
    /// When the project was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Check whether the given user owns this project.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// Data required to create a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// The class to create the project in.
    pub class_id: Uuid,
    /// The owning user.
    pub owner_id: Uuid,
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unique opaque storage-folder reference.
    pub folder_key: String,
}

/// Outcome of deleting a project.
///
/// The row cascade is already committed when this is returned; the blob
/// keys are what the caller still has to clean up best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDeletion {
    /// Storage keys of every document that went down with the project.
    pub blob_keys: Vec<String>,
}
