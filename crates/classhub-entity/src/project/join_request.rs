//! Join request entity and outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A pending request by a user to join a project.
///
/// Unique per (project, user). `approved` stays `false` for the life of
/// the row: approval consumes the row and adds the user to the member
/// set, so an approved request is never observable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JoinRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// The project the user wants to join.
    pub project_id: Uuid,
    /// The requesting user.
    pub user_id: Uuid,
    /// Always `false` while the row exists.
    pub approved: bool,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
}

/// Outcome of a join request call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// A new pending request was created.
    Requested,
    /// A pending request already existed; nothing changed.
    AlreadyPending,
}

impl JoinOutcome {
    /// Whether this call created a new request.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Requested)
    }
}
