//! Like entity and toggle outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user's like on one document.
///
/// At most one row per (document, user); the document's `likes` counter
/// always matches the row count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    /// The liked document.
    pub document_id: Uuid,
    /// The liking user.
    pub user_id: Uuid,
    /// When the like was placed.
    pub liked_at: DateTime<Utc>,
}

/// Direction a like toggle resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikeOutcome {
    /// The like row was created.
    Liked,
    /// The like row was removed.
    Unliked,
}

impl LikeOutcome {
    /// Return the outcome as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Liked => "liked",
            Self::Unliked => "unliked",
        }
    }
}

/// Result of an atomic like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    /// Which way the toggle went.
    pub outcome: LikeOutcome,
    /// The document's like counter after the toggle.
    pub likes: i64,
}
