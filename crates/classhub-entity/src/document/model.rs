//! Document entity model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A file attachment under a project.
///
/// `views` and `likes` are denormalized counters; both are mutated only
/// through atomic storage-level updates, never read-modify-write in
/// application code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    /// Unique document identifier.
    pub id: Uuid,
    /// The project this document belongs to.
    pub project_id: Uuid,
    /// The uploading owner.
    pub owner_id: Uuid,
    /// Document title.
    pub title: String,
    /// Key of the stored blob within the blob store.
    pub storage_key: String,
    /// Free-form description of the contents.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Total views, counted at most once per session.
    pub views: i64,
    /// Total likes; matches the number of like rows.
    pub likes: i64,
    /// When the document was uploaded.
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// The file name component of the storage key.
    pub fn file_name(&self) -> &str {
        self.storage_key
            .rsplit('/')
            .next()
            .unwrap_or(&self.storage_key)
    }
}

/// Data required to create a new document record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    /// The project to attach the document to.
    pub project_id: Uuid,
    /// The uploading owner.
    pub owner_id: Uuid,
    /// Document title.
    pub title: String,
    /// Key of the stored blob.
    pub storage_key: String,
    /// Free-form description.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Normalized tag names to associate (get-or-create).
    pub tags: Vec<String>,
}

/// Report returned by document deletion.
///
/// The record and its cascade are gone when this is returned; the blob
/// removal is best-effort and its outcome is surfaced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDeletion {
    /// The deleted document id.
    pub document_id: Uuid,
    /// Whether the underlying blob was removed from the blob store.
    pub blob_deleted: bool,
}
