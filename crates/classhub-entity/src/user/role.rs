//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The single-valued role label carried by every principal.
///
/// `PmaAdmin` is a materialized fact, not an assignment: a principal holds
/// it exactly while they appear in the PMA-admin set of at least one class,
/// and every admin-set mutation refreshes the label. `Anonymous` marks the
/// shared guest principal, which is barred from all mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Ordinary authenticated user; may own and join projects.
    Common,
    /// Administers the projects of one or more classes; barred from owning
    /// projects, joining them, or authoring comments.
    PmaAdmin,
    /// Unauthenticated guest; read-mostly and barred from gated operations.
    Anonymous,
}

impl UserRole {
    /// Check if this role is the PMA-admin label.
    pub fn is_pma_admin(&self) -> bool {
        matches!(self, Self::PmaAdmin)
    }

    /// Check if this role is the anonymous guest label.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::PmaAdmin => "pma_admin",
            Self::Anonymous => "anonymous",
        }
    }

    /// The role a user holds given their current global admin standing.
    ///
    /// Anonymous never changes; for everyone else the label follows the
    /// "admin of at least one class" predicate.
    pub fn materialized(self, is_admin_anywhere: bool) -> Self {
        match self {
            Self::Anonymous => Self::Anonymous,
            _ if is_admin_anywhere => Self::PmaAdmin,
            _ => Self::Common,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = classhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "pma_admin" => Ok(Self::PmaAdmin),
            "anonymous" => Ok(Self::Anonymous),
            _ => Err(classhub_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: common, pma_admin, anonymous"
            ))),
        }
    }
}
