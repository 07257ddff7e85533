//! The decision predicates behind every ClassHub mutation.
//!
//! Each predicate takes the acting principal and the minimal entity
//! context and returns `Ok(())` or a typed refusal — `PermissionDenied`
//! for authorization failures, `InvalidOperation` for structurally
//! disallowed mutations. Callers never proceed past an `Err`.
//!
//! The same functions serve both layers: services call them before
//! touching storage, and the store backends re-check the save-time
//! rules (class ownership, project ownership) so no write path can slip
//! past them.

use uuid::Uuid;

use classhub_core::{AppError, AppResult};

use crate::actor::Actor;

/// Refuse the anonymous guest.
///
/// Every gated operation starts here: the guest principal may browse
/// but never mutate or read principal-scoped data.
pub fn require_authenticated(actor: &Actor) -> AppResult<()> {
    if actor.is_anonymous() {
        return Err(AppError::permission_denied(
            "Access restricted for anonymous users",
        ));
    }
    Ok(())
}

/// Check whether the actor may own a class.
///
/// Class ownership is the superuser's privilege; this is also enforced
/// at save time inside the store backends.
pub fn can_own_class(actor: &Actor) -> AppResult<()> {
    require_authenticated(actor)?;
    if !actor.is_superuser {
        return Err(AppError::permission_denied("Owner must be a superuser"));
    }
    Ok(())
}

/// Check whether the actor may administer a class (replace its member
/// or admin sets, or delete it).
pub fn can_administer_class(actor: &Actor) -> AppResult<()> {
    require_authenticated(actor)?;
    if !actor.is_superuser {
        return Err(AppError::permission_denied(
            "Class administration requires a superuser",
        ));
    }
    Ok(())
}

/// Check whether the actor may own a project within the given class.
///
/// PMA admins administer projects; they never own them. Both the global
/// role label and the class's own admin set are consulted, so a freshly
/// appointed admin is refused even before the label could go stale.
pub fn can_own_project(actor: &Actor, class_admins: &[Uuid]) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.is_pma_admin() || class_admins.contains(&actor.id) {
        return Err(AppError::permission_denied(
            "Project owner must be a common user, not a PMA admin",
        ));
    }
    Ok(())
}

/// Check whether the actor may delete a project.
///
/// Open to the project owner and to any PMA admin of the owning class.
pub fn can_delete_project(
    actor: &Actor,
    project_owner: Uuid,
    class_admins: &[Uuid],
) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id == project_owner || class_admins.contains(&actor.id) {
        return Ok(());
    }
    Err(AppError::permission_denied(
        "Only the owner or a PMA admin of the class can delete this project",
    ))
}

/// Check whether the actor may delete a document.
///
/// Same shape as project deletion: the document owner or any PMA admin
/// of the project's class.
pub fn can_delete_document(
    actor: &Actor,
    document_owner: Uuid,
    class_admins: &[Uuid],
) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id == document_owner || class_admins.contains(&actor.id) {
        return Ok(());
    }
    Err(AppError::permission_denied(
        "Only the owner or a PMA admin of the class can delete this document",
    ))
}

/// Check whether the actor may author a comment (document or project).
pub fn can_author_comment(actor: &Actor) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.is_pma_admin() {
        return Err(AppError::permission_denied(
            "PMA admins cannot author comments",
        ));
    }
    Ok(())
}

/// Check whether the actor may delete a document comment.
///
/// Open to the comment author, the document owner, and the project
/// owner.
pub fn can_delete_document_comment(
    actor: &Actor,
    comment_author: Uuid,
    document_owner: Uuid,
    project_owner: Uuid,
) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id == comment_author || actor.id == document_owner || actor.id == project_owner {
        return Ok(());
    }
    Err(AppError::permission_denied(
        "Only the comment author, document owner, or project owner can delete this comment",
    ))
}

/// Check whether the actor may delete a project comment.
///
/// Open to the comment author and the project owner.
pub fn can_delete_project_comment(
    actor: &Actor,
    comment_author: Uuid,
    project_owner: Uuid,
) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id == comment_author || actor.id == project_owner {
        return Ok(());
    }
    Err(AppError::permission_denied(
        "Only the comment author or project owner can delete this comment",
    ))
}

/// Check whether the actor may request to join a project.
///
/// PMA admins never join projects, and an existing member has nothing
/// to request.
pub fn can_request_join(actor: &Actor, project_members: &[Uuid]) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.is_pma_admin() {
        return Err(AppError::permission_denied(
            "PMA admins cannot join projects",
        ));
    }
    if project_members.contains(&actor.id) {
        return Err(AppError::permission_denied(
            "Already a member of this project",
        ));
    }
    Ok(())
}

/// Check whether the actor may approve or deny join requests.
///
/// Owner-only; PMA admins are refused even for projects they administer.
pub fn can_manage_join(actor: &Actor, project_owner: Uuid) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.is_pma_admin() {
        return Err(AppError::permission_denied(
            "PMA admins cannot manage join requests",
        ));
    }
    if actor.id != project_owner {
        return Err(AppError::permission_denied(
            "Only the project owner can manage join requests",
        ));
    }
    Ok(())
}

/// Check whether the actor may add a member to a project.
pub fn can_add_member(actor: &Actor, project_owner: Uuid) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.is_pma_admin() {
        return Err(AppError::permission_denied("PMA admins cannot add members"));
    }
    if actor.id != project_owner {
        return Err(AppError::permission_denied(
            "Only the project owner can add members",
        ));
    }
    Ok(())
}

/// Check whether the actor may remove the given member from a project.
///
/// The owner may remove any member, and a member may remove themself
/// ("leave") — but the owner can never be removed, not even by their own
/// hand. That case is `InvalidOperation` rather than a permission
/// refusal because the mutation itself is structurally disallowed.
pub fn can_remove_member(actor: &Actor, project_owner: Uuid, member: Uuid) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id != project_owner && actor.id != member {
        return Err(AppError::permission_denied(
            "Only the project owner can remove members",
        ));
    }
    if member == project_owner {
        return Err(AppError::invalid_operation(
            "The project owner cannot be removed from members",
        ));
    }
    Ok(())
}

/// Check whether the actor may replace a project's member set.
pub fn can_replace_members(actor: &Actor, project_owner: Uuid) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id != project_owner {
        return Err(AppError::permission_denied(
            "Only the project owner can replace the member set",
        ));
    }
    Ok(())
}

/// Check whether the actor may edit the given user's profile.
pub fn can_edit_profile(actor: &Actor, subject_id: Uuid) -> AppResult<()> {
    require_authenticated(actor)?;
    if actor.id != subject_id {
        return Err(AppError::permission_denied(
            "Profiles can only be edited by their owner",
        ));
    }
    Ok(())
}
