//! Project lifecycle: creation, listings, deletion, and the comment thread.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_core::traits::blob::BlobStore;
use classhub_database::{ClassStore, ProjectStore};
use classhub_entity::project::{CreateProject, CreateProjectComment, Project, ProjectComment};

use crate::context::RequestContext;

/// Handles project lifecycle and project-page comments.
#[derive(Debug, Clone)]
pub struct ProjectService {
    /// Project store.
    projects: Arc<dyn ProjectStore>,
    /// Class store, for admin-set lookups.
    classes: Arc<dyn ClassStore>,
    /// Blob store, for cleaning up document files after a cascade.
    blobs: Arc<dyn BlobStore>,
}

/// Data for creating a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    /// The class to create the project in.
    pub class_id: Uuid,
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl ProjectService {
    /// Creates a new project service.
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        classes: Arc<dyn ClassStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            projects,
            classes,
            blobs,
        }
    }

    /// Creates a project owned by the caller.
    ///
    /// The owner must be a common user with respect to the target class:
    /// PMA admins are refused here and again at save time. A fresh
    /// storage-folder reference is minted for the project's documents.
    pub async fn create_project(
        &self,
        ctx: &RequestContext,
        req: CreateProjectRequest,
    ) -> Result<Project, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Project name cannot be empty"));
        }

        self.classes
            .find_by_id(req.class_id)
            .await?
            .ok_or_else(|| AppError::not_found("Class not found"))?;
        let admins = self.classes.admins(req.class_id).await?;
        policy::can_own_project(&ctx.actor, &admins)?;

        let folder_key = format!("documents/project-{}", Uuid::new_v4());
        let project = self
            .projects
            .create(&CreateProject {
                class_id: req.class_id,
                owner_id: ctx.user_id(),
                name: name.to_string(),
                description: req.description,
                folder_key,
            })
            .await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project.id,
            class_id = %project.class_id,
            "Project created"
        );

        Ok(project)
    }

    /// Gets a project by id.
    pub async fn get_project(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Project, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_project(project_id).await
    }

    /// Lists a class's projects, newest first.
    pub async fn list_for_class(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
    ) -> Result<Vec<Project>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.classes
            .find_by_id(class_id)
            .await?
            .ok_or_else(|| AppError::not_found("Class not found"))?;
        self.projects.list_for_class(class_id).await
    }

    /// Lists the projects the caller owns or belongs to, newest first.
    pub async fn my_projects(&self, ctx: &RequestContext) -> Result<Vec<Project>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.projects.list_for_user(ctx.user_id()).await
    }

    /// Deletes a project along with its documents and files.
    ///
    /// Open to the owner and to PMA admins of the owning class. Document
    /// blobs are removed best-effort after the record cascade commits.
    pub async fn delete_project(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let project = self.fetch_project(project_id).await?;
        let admins = self.classes.admins(project.class_id).await?;
        policy::can_delete_project(&ctx.actor, project.owner_id, &admins)?;

        let deletion = self.projects.delete(project_id).await?;

        for key in &deletion.blob_keys {
            if !self.blobs.delete(key).await {
                warn!(project_id = %project_id, key = %key, "Failed to delete document blob during project cleanup");
            }
        }

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            blobs = deletion.blob_keys.len(),
            "Project deleted"
        );

        Ok(())
    }

    /// Appends a comment to the project thread.
    ///
    /// PMA admins cannot author comments.
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        content: &str,
    ) -> Result<ProjectComment, AppError> {
        policy::can_author_comment(&ctx.actor)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }

        self.fetch_project(project_id).await?;

        let comment = self
            .projects
            .add_comment(&CreateProjectComment {
                project_id,
                author_id: ctx.user_id(),
                content: content.to_string(),
            })
            .await?;

        info!(
            user_id = %ctx.user_id(),
            project_id = %project_id,
            comment_id = %comment.id,
            "Project comment added"
        );

        Ok(comment)
    }

    /// Lists a project's comments, newest first.
    pub async fn comments(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<ProjectComment>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_project(project_id).await?;
        self.projects.comments(project_id).await
    }

    /// Deletes a project comment.
    ///
    /// Open to the comment author and the project owner.
    pub async fn delete_comment(
        &self,
        ctx: &RequestContext,
        comment_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let comment = self
            .projects
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        let project = self.fetch_project(comment.project_id).await?;
        policy::can_delete_project_comment(&ctx.actor, comment.author_id, project.owner_id)?;

        if !self.projects.delete_comment(comment_id).await? {
            return Err(AppError::not_found("Comment not found"));
        }

        info!(user_id = %ctx.user_id(), comment_id = %comment_id, "Project comment deleted");

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
