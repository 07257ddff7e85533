//! User repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::AppResult;
use classhub_entity::user::{CreateUser, UpdateProfile, User};

use crate::store::UserStore;

/// Data access for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a repository bound to the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, display_name, is_superuser, computing_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(data.is_superuser)
        .bind(&data.computing_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_username_key") =>
            {
                AppError::conflict("username is already taken")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_computing_id_key") =>
            {
                AppError::conflict("computing id is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to create user", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find user", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to find user by username", e)
            })
    }

    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users \
             SET email = $2, display_name = $3, computing_id = $4, major = $5, \
                 year = $6, bio = $7, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING *",
        )
        .bind(data.id)
        .bind(&data.email)
        .bind(&data.display_name)
        .bind(&data.computing_id)
        .bind(&data.major)
        .bind(data.year)
        .bind(&data.bio)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("users_computing_id_key") =>
            {
                AppError::conflict("computing id is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to update profile", e),
        })?
        .ok_or_else(|| AppError::not_found("user not found"))
    }

    async fn replace_avatar(&self, user_id: Uuid, avatar_key: &str) -> AppResult<Option<String>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        let previous = sqlx::query_scalar::<_, Option<String>>(
            "SELECT avatar_key FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to load current avatar", e)
        })?
        .ok_or_else(|| AppError::not_found("user not found"))?;

        sqlx::query("UPDATE users SET avatar_key = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(avatar_key)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to update avatar", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(previous)
    }
}
