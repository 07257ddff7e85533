//! User self-service operations: registration, profile updates, avatars.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_core::traits::blob::BlobStore;
use classhub_database::UserStore;
use classhub_entity::user::{AcademicYear, CreateUser, UpdateProfile, User};

use crate::context::RequestContext;

/// Maximum accepted username length.
const MAX_USERNAME_LEN: usize = 150;

/// Maximum accepted computing-id length.
const MAX_COMPUTING_ID_LEN: usize = 10;

/// Maximum accepted bio length.
const MAX_BIO_LEN: usize = 500;

/// Handles account registration and profile self-service.
#[derive(Debug, Clone)]
pub struct UserService {
    /// Account store.
    users: Arc<dyn UserStore>,
    /// Blob store holding profile pictures.
    blobs: Arc<dyn BlobStore>,
    /// Upper bound on accepted profile picture sizes, in bytes.
    max_upload_size_bytes: u64,
}

/// Data for registering a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    /// Desired username.
    pub username: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// University computing id (optional).
    pub computing_id: Option<String>,
}

/// Data for updating a user's own profile.
///
/// Fields are replaced wholesale; `None` clears the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    /// The user whose profile is updated.
    pub user_id: Uuid,
    /// New email address.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
    /// New computing id.
    pub computing_id: Option<String>,
    /// New major.
    pub major: Option<String>,
    /// New academic year.
    pub year: Option<AcademicYear>,
    /// New bio.
    pub bio: Option<String>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        blobs: Arc<dyn BlobStore>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            users,
            blobs,
            max_upload_size_bytes,
        }
    }

    /// Registers a new common user.
    ///
    /// Registration is the one entry point open to the guest, so this
    /// takes no request context.
    pub async fn register(&self, req: RegisterUserRequest) -> Result<User, AppError> {
        let username = validate_username(&req.username)?;
        if let Some(email) = req.email.as_deref() {
            validate_email(email)?;
        }
        let computing_id = normalize_computing_id(req.computing_id)?;

        let user = self
            .users
            .create(&CreateUser {
                username,
                email: req.email,
                display_name: req.display_name,
                is_superuser: false,
                computing_id,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Provisions a superuser account.
    ///
    /// The only path that grants class-ownership standing. Meant to be
    /// reached from operator tooling, never from regular registration.
    pub async fn register_superuser(&self, req: RegisterUserRequest) -> Result<User, AppError> {
        let username = validate_username(&req.username)?;
        if let Some(email) = req.email.as_deref() {
            validate_email(email)?;
        }
        let computing_id = normalize_computing_id(req.computing_id)?;

        let user = self
            .users
            .create(&CreateUser {
                username,
                email: req.email,
                display_name: req.display_name,
                is_superuser: true,
                computing_id,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "Superuser provisioned");

        Ok(user)
    }

    /// Gets a user's profile by id.
    pub async fn get_profile(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Gets a user's profile by username.
    pub async fn get_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<User, AppError> {
        policy::require_authenticated(&ctx.actor)?;
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates a user's profile fields.
    ///
    /// Only the profile owner may do this. Role and superuser standing
    /// are not reachable through this path.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        req: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        policy::can_edit_profile(&ctx.actor, req.user_id)?;

        if let Some(email) = req.email.as_deref() {
            validate_email(email)?;
        }
        let computing_id = normalize_computing_id(req.computing_id)?;
        if let Some(bio) = req.bio.as_deref() {
            if bio.len() > MAX_BIO_LEN {
                return Err(AppError::validation(format!(
                    "Bio cannot exceed {MAX_BIO_LEN} characters"
                )));
            }
        }

        let user = self
            .users
            .update_profile(&UpdateProfile {
                id: req.user_id,
                email: req.email,
                display_name: req.display_name,
                computing_id,
                major: req.major,
                year: req.year,
                bio: req.bio,
            })
            .await?;

        info!(user_id = %ctx.user_id(), "Profile updated");

        Ok(user)
    }

    /// Stores a new profile picture and points the account at it.
    ///
    /// The previous picture, if any, is deleted from the blob store
    /// best-effort once the swap is on record.
    pub async fn set_avatar(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<User, AppError> {
        policy::can_edit_profile(&ctx.actor, user_id)?;

        let file_name = validate_file_name(file_name)?;
        if data.len() as u64 > self.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let avatar_key = format!("profiles/{}/{}", user.username, file_name);
        self.blobs.put(&avatar_key, data).await?;

        let previous = self.users.replace_avatar(user_id, &avatar_key).await?;
        if let Some(old_key) = previous {
            if old_key != avatar_key && !self.blobs.delete(&old_key).await {
                warn!(user_id = %user_id, key = %old_key, "Failed to delete replaced avatar blob");
            }
        }

        info!(user_id = %user_id, key = %avatar_key, "Avatar updated");

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Reads a user's current profile picture.
    pub async fn avatar_bytes(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<Bytes, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let key = user
            .avatar_key
            .as_deref()
            .ok_or_else(|| AppError::not_found("User has no profile picture"))?;

        self.blobs.read_bytes(key).await
    }
}

/// Validates and normalizes a requested username.
fn validate_username(raw: &str) -> Result<String, AppError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::validation("Username cannot contain whitespace"));
    }
    Ok(username.to_string())
}

/// Rejects email values with no plausible structure.
fn validate_email(email: &str) -> Result<(), AppError> {
    if !email.contains('@') || !email.contains('.') {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(())
}

/// Normalizes an optional computing id; blank collapses to `None` rather
/// than an empty string.
fn normalize_computing_id(raw: Option<String>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw else { return Ok(None) };
    let id = raw.trim();
    if id.is_empty() {
        return Ok(None);
    }
    if id.len() > MAX_COMPUTING_ID_LEN {
        return Err(AppError::validation(format!(
            "Computing id cannot exceed {MAX_COMPUTING_ID_LEN} characters"
        )));
    }
    Ok(Some(id.to_string()))
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
