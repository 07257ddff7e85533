//! Class administration: creation, rosters, admin sets, deletion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_core::traits::blob::BlobStore;
use classhub_database::{ClassStore, UserStore};
use classhub_entity::class::{AdminSetUpdate, Class, ClassDeletion, CreateClass};
use classhub_entity::user::User;

use crate::context::RequestContext;

/// Handles class lifecycle and the admin sets that drive role labels.
#[derive(Debug, Clone)]
pub struct ClassService {
    /// Class store.
    classes: Arc<dyn ClassStore>,
    /// Account store, for hydrating rosters.
    users: Arc<dyn UserStore>,
    /// Blob store, for cleaning up document files after a cascade.
    blobs: Arc<dyn BlobStore>,
}

/// Data for creating a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassRequest {
    /// Unique enrollment code, e.g. `"CS3240-F24"`.
    pub code: String,
    /// Class name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl ClassService {
    /// Creates a new class service.
    pub fn new(
        classes: Arc<dyn ClassStore>,
        users: Arc<dyn UserStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            classes,
            users,
            blobs,
        }
    }

    /// Creates a class owned by the calling superuser.
    pub async fn create_class(
        &self,
        ctx: &RequestContext,
        req: CreateClassRequest,
    ) -> Result<Class, AppError> {
        policy::can_own_class(&ctx.actor)?;

        let code = req.code.trim();
        if code.is_empty() {
            return Err(AppError::validation("Class code cannot be empty"));
        }
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Class name cannot be empty"));
        }

        let class = self
            .classes
            .create(&CreateClass {
                owner_id: ctx.user_id(),
                code: code.to_string(),
                name: name.to_string(),
                description: req.description,
            })
            .await?;

        info!(user_id = %ctx.user_id(), class_id = %class.id, code = %class.code, "Class created");

        Ok(class)
    }

    /// Gets a class by id.
    pub async fn get_class(&self, ctx: &RequestContext, class_id: Uuid) -> Result<Class, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_class(class_id).await
    }

    /// Gets a class by its enrollment code.
    pub async fn get_by_code(&self, ctx: &RequestContext, code: &str) -> Result<Class, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.classes
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("Class not found"))
    }

    /// Lists every class, newest first.
    pub async fn list_classes(&self, ctx: &RequestContext) -> Result<Vec<Class>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.classes.list().await
    }

    /// Lists the users on a class roster.
    pub async fn class_members(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_class(class_id).await?;
        let ids = self.classes.members(class_id).await?;
        self.resolve_users(&ids).await
    }

    /// Lists the users in a class's PMA admin set.
    pub async fn class_admins(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.fetch_class(class_id).await?;
        let ids = self.classes.admins(class_id).await?;
        self.resolve_users(&ids).await
    }

    /// Replaces the class roster wholesale. Superuser only.
    pub async fn set_members(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<(), AppError> {
        policy::can_administer_class(&ctx.actor)?;
        self.fetch_class(class_id).await?;

        self.classes.replace_members(class_id, member_ids).await?;

        info!(
            user_id = %ctx.user_id(),
            class_id = %class_id,
            members = member_ids.len(),
            "Class roster replaced"
        );

        Ok(())
    }

    /// Replaces the class's PMA admin set wholesale. Superuser only.
    ///
    /// The role labels of everyone who entered or left the set are
    /// rewritten in the same transaction as the set change; the returned
    /// update reports what was written.
    pub async fn set_pma_admins(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
        admin_ids: &[Uuid],
    ) -> Result<AdminSetUpdate, AppError> {
        policy::can_administer_class(&ctx.actor)?;
        self.fetch_class(class_id).await?;

        let update = self.classes.replace_admins(class_id, admin_ids).await?;

        info!(
            user_id = %ctx.user_id(),
            class_id = %class_id,
            added = update.added.len(),
            removed = update.removed.len(),
            "PMA admin set replaced"
        );

        Ok(update)
    }

    /// Deletes a class along with its projects and documents. Superuser
    /// only.
    ///
    /// Document blobs are removed best-effort after the record cascade
    /// commits; former admins who sit in no other admin set lose their
    /// PMA-admin label in the same transaction as the cascade.
    pub async fn delete_class(
        &self,
        ctx: &RequestContext,
        class_id: Uuid,
    ) -> Result<ClassDeletion, AppError> {
        policy::can_administer_class(&ctx.actor)?;
        self.fetch_class(class_id).await?;

        let deletion = self.classes.delete(class_id).await?;

        for key in &deletion.blob_keys {
            if !self.blobs.delete(key).await {
                warn!(class_id = %class_id, key = %key, "Failed to delete document blob during class cleanup");
            }
        }

        info!(
            user_id = %ctx.user_id(),
            class_id = %class_id,
            blobs = deletion.blob_keys.len(),
            role_changes = deletion.role_changes.len(),
            "Class deleted"
        );

        Ok(deletion)
    }

    /// Fetches a class or reports `NotFound`.
    async fn fetch_class(&self, class_id: Uuid) -> Result<Class, AppError> {
        self.classes
            .find_by_id(class_id)
            .await?
            .ok_or_else(|| AppError::not_found("Class not found"))
    }

    /// Resolves ids to accounts, skipping any that no longer resolve.
    async fn resolve_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AppError> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.users.find_by_id(*id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }
}
