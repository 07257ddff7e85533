//! Document lifecycle: upload, retrieval, download, deletion.

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_core::traits::blob::BlobStore;
use classhub_database::{ClassStore, DocumentStore, ProjectStore};
use classhub_entity::document::{CreateDocument, Document, DocumentDeletion, Tag};
use classhub_entity::project::Project;

use crate::context::RequestContext;

/// Handles document records and the blobs behind them.
#[derive(Debug, Clone)]
pub struct DocumentService {
    /// Document store.
    documents: Arc<dyn DocumentStore>,
    /// Project store, for membership checks.
    projects: Arc<dyn ProjectStore>,
    /// Class store, for admin-set lookups on deletion.
    classes: Arc<dyn ClassStore>,
    /// Blob store holding the document files.
    blobs: Arc<dyn BlobStore>,
    /// Upper bound on accepted upload sizes, in bytes.
    max_upload_size_bytes: u64,
}

/// Data for uploading a document. The file contents travel separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDocumentRequest {
    /// The project to attach the document to.
    pub project_id: Uuid,
    /// Document title.
    pub title: String,
    /// Bare file name; becomes the last segment of the storage key.
    pub file_name: String,
    /// Free-form description.
    pub description: String,
    /// Optional due date.
    pub due_date: Option<NaiveDate>,
    /// Raw tag names; normalized and deduplicated before storage.
    pub tags: Vec<String>,
}

impl DocumentService {
    /// Creates a new document service.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        projects: Arc<dyn ProjectStore>,
        classes: Arc<dyn ClassStore>,
        blobs: Arc<dyn BlobStore>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            documents,
            projects,
            classes,
            blobs,
            max_upload_size_bytes,
        }
    }

    /// Uploads a document into a project.
    ///
    /// Only project members (the owner included) may upload. The record
    /// goes in first, which is what refuses a duplicate file name
    /// without ever touching the existing document's blob; if storing
    /// the blob then fails, the fresh record is removed best-effort.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        req: UploadDocumentRequest,
        data: Bytes,
    ) -> Result<Document, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::validation("Title cannot be empty"));
        }
        let file_name = validate_file_name(&req.file_name)?;
        let size = data.len();
        if size as u64 > self.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }

        let project = self.fetch_project(req.project_id).await?;
        if !project.is_owned_by(ctx.user_id())
            && !self
                .projects
                .is_member(req.project_id, ctx.user_id())
                .await?
        {
            return Err(AppError::permission_denied(
                "Only project members can upload documents",
            ));
        }

        let storage_key = format!("{}/{}", project.folder_key, file_name);
        let document = self
            .documents
            .create(&CreateDocument {
                project_id: req.project_id,
                owner_id: ctx.user_id(),
                title: title.to_string(),
                storage_key: storage_key.clone(),
                description: req.description,
                due_date: req.due_date,
                tags: Tag::normalize_all(&req.tags),
            })
            .await?;

        if let Err(e) = self.blobs.put(&storage_key, data).await {
            // The file never made it; do not leave the record behind.
            match self.documents.delete(document.id).await {
                Ok(_) => {}
                Err(cleanup) => {
                    warn!(
                        document_id = %document.id,
                        error = %cleanup,
                        "Failed to remove document record after blob store failure"
                    );
                }
            }
            return Err(e);
        }

        info!(
            user_id = %ctx.user_id(),
            document_id = %document.id,
            project_id = %document.project_id,
            size,
            "Document uploaded"
        );

        Ok(document)
    }

    /// Gets a document by id.
    pub async fn get_document(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Document, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_document(document_id).await
    }

    /// Lists a project's documents, newest first.
    pub async fn list_for_project(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<Document>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_project(project_id).await?;
        self.documents.list_for_project(project_id).await
    }

    /// Returns a document's tags, sorted by name.
    pub async fn tags(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Vec<Tag>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_document(document_id).await?;
        self.documents.tags_for(document_id).await
    }

    /// Reads a document's file contents.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<Bytes, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        let document = self.fetch_document(document_id).await?;
        self.blobs.read_bytes(&document.storage_key).await
    }

    /// Deletes a document and its file.
    ///
    /// Open to the document owner and to PMA admins of the owning class.
    /// The blob goes first; the record deletion proceeds even when blob
    /// removal fails, and the outcome reports both.
    pub async fn delete_document(
        &self,
        ctx: &RequestContext,
        document_id: Uuid,
    ) -> Result<DocumentDeletion, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let document = self.fetch_document(document_id).await?;
        let project = self.fetch_project(document.project_id).await?;
        let admins = self.classes.admins(project.class_id).await?;
        policy::can_delete_document(&ctx.actor, document.owner_id, &admins)?;

        let blob_deleted = self.blobs.delete(&document.storage_key).await;
        if !blob_deleted {
            warn!(
                document_id = %document_id,
                key = %document.storage_key,
                "Blob removal failed; deleting the record anyway"
            );
        }

        if !self.documents.delete(document_id).await? {
            return Err(AppError::not_found("Document not found"));
        }

        info!(
            user_id = %ctx.user_id(),
            document_id = %document_id,
            blob_deleted,
            "Document deleted"
        );

        Ok(DocumentDeletion {
            document_id,
            blob_deleted,
        })
    }

    /// Fetches a project or reports `NotFound`.
    async fn fetch_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("Project not found"))
    }

    /// Fetches a document or reports `NotFound`.
    async fn fetch_document(&self, document_id: Uuid) -> Result<Document, AppError> {
        self.documents
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::not_found("Document not found"))
    }
}

/// Validates a bare file name destined for a blob key segment.
fn validate_file_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::validation("File name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::validation(
            "File name cannot contain path separators",
        ));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation("File name cannot be a path component"));
    }
    Ok(name.to_string())
}
