//! Class repository.
//!
//! Holds the only write paths that touch the materialized role label:
//! replacing a class's admin set and deleting a class both recompute the
//! label of every affected user inside the same transaction as the set
//! change, so no interleaving can observe a stale label.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use classhub_auth::{policy, Actor};
use classhub_core::error::{AppError, ErrorKind};
use classhub_core::AppResult;
use classhub_entity::class::{AdminSetUpdate, Class, ClassDeletion, CreateClass};
use classhub_entity::user::{RoleChange, User, UserRole};

use crate::store::ClassStore;

/// Data access for classes, rosters, and admin sets.
#[derive(Debug, Clone)]
pub struct ClassRepository {
    pool: PgPool,
}

impl ClassRepository {
    /// Creates a repository bound to the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Rewrites the stored role label of each given user from the current
/// admin-set state: PMA admin when they sit in any class's admin set,
/// common otherwise. The anonymous label is never rewritten.
///
/// Callers must already hold row locks on the affected users.
async fn recompute_roles(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[Uuid],
) -> AppResult<Vec<RoleChange>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, (Uuid, UserRole)>(
        "UPDATE users \
         SET role = CASE \
                 WHEN role = 'anonymous' THEN 'anonymous'::user_role \
                 WHEN EXISTS (SELECT 1 FROM class_admins ca WHERE ca.user_id = users.id) \
                     THEN 'pma_admin'::user_role \
                 ELSE 'common'::user_role \
             END, \
             updated_at = NOW() \
         WHERE id = ANY($1) \
         RETURNING id, role",
    )
    .bind(user_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| {
        AppError::with_source(ErrorKind::Database, "failed to recompute role labels", e)
    })?;

    Ok(rows
        .into_iter()
        .map(|(user_id, role)| RoleChange { user_id, role })
        .collect())
}

#[async_trait]
impl ClassStore for ClassRepository {
    async fn create(&self, data: &CreateClass) -> AppResult<Class> {
        // Save-time rule: only a superuser may own a class. Superuser
        // standing is immutable, so a plain read suffices here.
        let owner = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(data.owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to load class owner", e)
            })?
            .ok_or_else(|| AppError::not_found("owner not found"))?;
        policy::can_own_class(&Actor::from(&owner))?;

        sqlx::query_as::<_, Class>(
            "INSERT INTO classes (owner_id, code, name, description) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(data.owner_id)
        .bind(&data.code)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("classes_code_key") =>
            {
                AppError::conflict("class code is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to create class", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Class>> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find class", e))
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Class>> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to find class by code", e)
            })
    }

    async fn list(&self) -> AppResult<Vec<Class>> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to list classes", e))
    }

    async fn members(&self, class_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM class_members WHERE class_id = $1 ORDER BY user_id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to list class members", e))
    }

    async fn admins(&self, class_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM class_admins WHERE class_id = $1 ORDER BY user_id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to list class admins", e))
    }

    async fn is_admin(&self, class_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM class_admins WHERE class_id = $1 AND user_id = $2)",
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to check class admin", e)
        })
    }

    async fn is_admin_anywhere(&self, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM class_admins WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to check admin standing", e)
        })
    }

    async fn replace_members(&self, class_id: Uuid, member_ids: &[Uuid]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
            .bind(class_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock class", e))?
            .ok_or_else(|| AppError::not_found("class not found"))?;

        sqlx::query("DELETE FROM class_members WHERE class_id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to clear class members", e)
            })?;

        sqlx::query(
            "INSERT INTO class_members (class_id, user_id) \
             SELECT $1, unnest($2::uuid[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(class_id)
        .bind(member_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("class_members_user_id_fkey") =>
            {
                AppError::not_found("user named in member set not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to insert class members", e),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(())
    }

    async fn replace_admins(
        &self,
        class_id: Uuid,
        admin_ids: &[Uuid],
    ) -> AppResult<AdminSetUpdate> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        // Lock the class row so concurrent admin-set rewrites serialize.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
            .bind(class_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock class", e))?
            .ok_or_else(|| AppError::not_found("class not found"))?;

        let current: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM class_admins WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to load current admins", e)
        })?;

        let desired: HashSet<Uuid> = admin_ids.iter().copied().collect();
        let current_set: HashSet<Uuid> = current.into_iter().collect();
        let mut added: Vec<Uuid> = desired.difference(&current_set).copied().collect();
        let mut removed: Vec<Uuid> = current_set.difference(&desired).copied().collect();
        added.sort_unstable();
        removed.sort_unstable();

        if added.is_empty() && removed.is_empty() {
            return Ok(AdminSetUpdate {
                added,
                removed,
                role_changes: Vec::new(),
            });
        }

        // Lock the affected users in id order; concurrent recomputes then
        // queue up instead of deadlocking.
        let mut affected: Vec<Uuid> = added.iter().chain(removed.iter()).copied().collect();
        affected.sort_unstable();

        let locked: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&affected)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to lock affected users", e)
        })?;

        let locked: HashSet<Uuid> = locked.into_iter().collect();
        if added.iter().any(|id| !locked.contains(id)) {
            return Err(AppError::not_found("user named in admin set not found"));
        }

        sqlx::query("DELETE FROM class_admins WHERE class_id = $1 AND user_id = ANY($2)")
            .bind(class_id)
            .bind(&removed)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to remove class admins", e)
            })?;

        sqlx::query(
            "INSERT INTO class_admins (class_id, user_id) \
             SELECT $1, unnest($2::uuid[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(class_id)
        .bind(&added)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to insert class admins", e)
        })?;

        let role_changes = recompute_roles(&mut tx, &affected).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(AdminSetUpdate {
            added,
            removed,
            role_changes,
        })
    }

    async fn delete(&self, class_id: Uuid) -> AppResult<ClassDeletion> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM classes WHERE id = $1 FOR UPDATE")
            .bind(class_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock class", e))?
            .ok_or_else(|| AppError::not_found("class not found"))?;

        let mut former_admins: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM class_admins WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to load class admins", e)
        })?;
        former_admins.sort_unstable();

        // Collect the blob keys before the cascade takes the rows with it.
        let blob_keys: Vec<String> = sqlx::query_scalar(
            "SELECT d.storage_key \
             FROM documents d \
             INNER JOIN projects p ON d.project_id = p.id \
             WHERE p.class_id = $1 \
             ORDER BY d.storage_key",
        )
        .bind(class_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to collect document keys", e)
        })?;

        if !former_admins.is_empty() {
            sqlx::query("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&former_admins)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "failed to lock former admins", e)
                })?;
        }

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to delete class", e)
            })?;

        // The cascade has emptied this class's admin set; former admins
        // keep the label only if some other class still lists them.
        let role_changes = recompute_roles(&mut tx, &former_admins).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(ClassDeletion {
            role_changes,
            blob_keys,
        })
    }
}
