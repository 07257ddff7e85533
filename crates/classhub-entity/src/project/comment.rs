//! Project comment entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A comment left on a project page.
///
/// Listed newest-first. PMA admins cannot author these; deletion is open
/// to the author and the project owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectComment {
    /// Unique comment identifier.
    pub id: Uuid,
    /// The project commented on.
    pub project_id: Uuid,
    /// The comment author.
    pub author_id: Uuid,
    /// Comment body.
    pub content: String,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
    /// When the comment was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a project comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectComment {
    /// The project commented on.
    pub project_id: Uuid,
    /// The comment author.
    pub author_id: Uuid,
    /// Comment body.
    pub content: String,
}
