//! Project membership: rosters and the join-request workflow.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_database::{ProjectStore, UserStore};
use classhub_entity::project::{JoinOutcome, JoinRequest, Project};
use classhub_entity::user::User;

use crate::context::RequestContext;

/// Handles project member sets and join requests.
#[derive(Debug, Clone)]
pub struct MembershipService {
    /// Project store.
    projects: Arc<dyn ProjectStore>,
    /// Account store, for hydrating member lists.
    users: Arc<dyn UserStore>,
}

impl MembershipService {
    /// Creates a new membership service.
    pub fn new(projects: Arc<dyn ProjectStore>, users: Arc<dyn UserStore>) -> Self {
        Self { projects, users }
    }

    /// Lists a project's members.
    pub async fn members(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_project(project_id).await?;

        let ids = self.projects.members(project_id).await?;
        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.users.find_by_id(id).await? {
                members.push(user);
            }
        }
        Ok(members)
    }

    /// Adds a member directly. Owner only.
    pub async fn add_member(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_add_member(&ctx.actor, project.owner_id)?;

        self.projects.add_member(project_id, user_id).await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            member_id = %user_id,
            "Member added"
        );

        Ok(())
    }

    /// Removes a member, or lets a member leave.
    ///
    /// The owner may remove anyone but themself; a member may remove
    /// only themself. The owner can never be removed.
    pub async fn remove_member(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_remove_member(&ctx.actor, project.owner_id, user_id)?;

        self.projects.remove_member(project_id, user_id).await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            member_id = %user_id,
            "Member removed"
        );

        Ok(())
    }

    /// Replaces the member set wholesale. Owner only.
    ///
    /// The owner stays in the set no matter what the new list says.
    /// Returns the set actually stored.
    pub async fn set_members(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_replace_members(&ctx.actor, project.owner_id)?;

        let stored = self.projects.replace_members(project_id, member_ids).await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            members = stored.len(),
            "Member set replaced"
        );

        Ok(stored)
    }

    /// Files a request to join a project.
    ///
    /// A repeat request is not an error; the outcome reports whether a
    /// new request was actually created.
    pub async fn request_join(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<JoinOutcome, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        self.fetch_project(project_id).await?;
        let members = self.projects.members(project_id).await?;
        policy::can_request_join(&ctx.actor, &members)?;

        let outcome = self
            .projects
            .create_join_request(project_id, ctx.user_id())
            .await?;

        match outcome {
            JoinOutcome::Requested => {
                info!(user_id = %ctx.user_id(), project_id = %project_id, "Join requested");
            }
            JoinOutcome::AlreadyPending => {
                info!(user_id = %ctx.user_id(), project_id = %project_id, "Join request already pending");
            }
        }

        Ok(outcome)
    }

    /// Lists a project's pending join requests, oldest first. Owner only.
    pub async fn pending_requests(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<JoinRequest>, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_manage_join(&ctx.actor, project.owner_id)?;

        self.projects.pending_requests(project_id).await
    }

    /// Approves a pending join request, enrolling the requester. Owner
    /// only.
    pub async fn approve_join(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_manage_join(&ctx.actor, project.owner_id)?;

        self.projects.approve_join(project_id, user_id).await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            member_id = %user_id,
            "Join request approved"
        );

        Ok(())
    }

    /// Denies a pending join request. Owner only.
    pub async fn deny_join(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        policy::can_manage_join(&ctx.actor, project.owner_id)?;

        self.projects.deny_join(project_id, user_id).await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            member_id = %user_id,
            "Join request denied"
        );

        Ok(())
    }

    /// Fetches a project or reports `NotFound`.
    async fn fetch_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))
    }
}
