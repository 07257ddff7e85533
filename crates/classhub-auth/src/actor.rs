//! The policy-facing snapshot of a principal.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use classhub_entity::user::{User, UserRole};

/// Everything the policy predicates need to know about the caller.
///
/// An `Actor` is a value snapshot taken when the request context is
/// built; predicates judge it as-of that moment. The anonymous guest is
/// an `Actor` like any other, carrying the nil id and the `Anonymous`
/// role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Principal identifier.
    pub id: Uuid,
    /// Materialized role label.
    pub role: UserRole,
    /// Whether the principal may own classes.
    pub is_superuser: bool,
}

impl Actor {
    /// Build an actor for an authenticated user.
    pub fn new(id: Uuid, role: UserRole, is_superuser: bool) -> Self {
        Self {
            id,
            role,
            is_superuser,
        }
    }

    /// The unauthenticated guest actor.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            role: UserRole::Anonymous,
            is_superuser: false,
        }
    }

    /// Check if this actor is the anonymous guest.
    pub fn is_anonymous(&self) -> bool {
        self.role.is_anonymous()
    }

    /// Check if this actor carries the PMA-admin label.
    pub fn is_pma_admin(&self) -> bool {
        self.role.is_pma_admin()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            is_superuser: user.is_superuser,
        }
    }
}
