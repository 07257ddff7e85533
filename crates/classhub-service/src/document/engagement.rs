//! Per-document engagement: views, likes, and comments.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_core::types::session::SessionViews;
use classhub_database::{DocumentStore, ProjectStore};
use classhub_entity::document::{CreateDocumentComment, Document, DocumentComment, LikeToggle};

use crate::context::RequestContext;

/// Handles view counting, like toggling, and document comments.
#[derive(Debug, Clone)]
pub struct EngagementService {
    /// Document store.
    documents: Arc<dyn DocumentStore>,
    /// Project store, for ownership context on comment deletion.
    projects: Arc<dyn ProjectStore>,
}

impl EngagementService {
    /// Creates a new engagement service.
    pub fn new(documents: Arc<dyn DocumentStore>, projects: Arc<dyn ProjectStore>) -> Self {
        Self {
            documents,
            projects,
        }
    }

    /// Records a view, counting it at most once per session.
    ///
    /// The caller owns the [`SessionViews`] value and persists it with
    /// its session; repeat views within the same session leave the
    /// counter alone. Returns the document carrying the current total.
    pub async fn record_view(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        session: &mut SessionViews,
    ) -> Result<Document, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let mut document = self.fetch_document(document_id).await?;
        if session.mark_viewed(document_id) {
            document.views = self.documents.increment_views(document_id).await?;
        }

        Ok(document)
    }

    /// Flips the caller's like on a document.
    ///
    /// Returns which way the toggle went and the like total after it.
    pub async fn toggle_like(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<LikeToggle, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let toggle = self
            .documents
            .toggle_like(document_id, ctx.user_id())
            .await?;

        info!(
            user_id = %ctx.user_id(),
            document_id = %document_id,
            outcome = toggle.outcome.as_str(),
            likes = toggle.likes,
            "Like toggled"
        );

        Ok(toggle)
    }

    /// Whether the caller currently likes the document.
    pub async fn is_liked(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<bool, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.documents
            .is_liked_by(document_id, ctx.user_id())
            .await
    }

    /// Appends a comment to a document.
    ///
    /// PMA admins cannot author comments.
    pub async fn add_comment(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
        content: &str,
    ) -> Result<DocumentComment, AppError> {
        policy::can_author_comment(&ctx.actor)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }

        self.fetch_document(document_id).await?;

        let comment = self
            .documents
            .add_comment(&CreateDocumentComment {
                document_id,
                author_id: ctx.user_id(),
                content: content.to_string(),
            })
            .await?;

        info!(
            user_id = %ctx.user_id(),
            document_id = %document_id,
            comment_id = %comment.id,
            "Document comment added"
        );

        Ok(comment)
    }

    /// Lists a document's comments, newest first.
    pub async fn comments(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Vec<DocumentComment>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_document(document_id).await?;
        self.documents.comments(document_id).await
    }

    /// Deletes a document comment.
    ///
    /// Open to the comment author, the document owner, and the project
    /// owner.
    pub async fn delete_comment(
        &self,
        ctx: &RequestContext,
        comment_id: Uuid,
    ) -> Result<(), AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let comment = self
            .documents
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        let document = self.fetch_document(comment.document_id).await?;
        let project = self
            .projects
            .find_by_id(document.project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))?;
        policy::can_delete_document_comment(
            &ctx.actor,
            comment.author_id,
            document.owner_id,
            project.owner_id,
        )?;

        if !self.documents.delete_comment(comment_id).await? {
            return Err(AppError::not_found("Comment not found"));
        }

        info!(user_id = %ctx.user_id(), comment_id = %comment_id, "Document comment deleted");

        Ok(())
    }

    /// Fetches a document or reports `NotFound`.
    async fn fetch_document(&self, document_id: Uuid) -> Result<Document, AppError> {
        self.documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))
    }
}
