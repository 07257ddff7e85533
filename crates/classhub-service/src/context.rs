//! Request context carrying the acting principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use classhub_auth::Actor;
use classhub_entity::user::User;

/// Context for the current request.
///
/// Built once at the edge (session middleware, a CLI login, a test
/// fixture) and passed into service methods so that every operation
/// knows *who* is acting. The embedded [`Actor`] is a snapshot; policy
/// predicates judge it as-of the moment the context was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Policy-facing snapshot of the caller.
    pub actor: Actor,
    /// The caller's username (convenience field for log lines).
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for an authenticated user.
    pub fn for_user(user: &User) -> Self {
        Self {
            actor: Actor::from(user),
            username: user.username.clone(),
            request_time: Utc::now(),
        }
    }

    /// Creates the anonymous guest context.
    pub fn anonymous() -> Self {
        Self {
            actor: Actor::anonymous(),
            username: "anonymous".to_string(),
            request_time: Utc::now(),
        }
    }

    /// The caller's user id (the nil UUID for the guest).
    pub fn user_id(&self) -> Uuid {
        self.actor.id
    }

    /// Returns whether the caller is the anonymous guest.
    pub fn is_anonymous(&self) -> bool {
        self.actor.is_anonymous()
    }
}
