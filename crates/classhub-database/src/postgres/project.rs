//! Project repository.
//!
//! Every membership write here re-asserts the owner-stays-a-member rule
//! inside its transaction, so no sequence of removals, replacements, or
//! approvals can leave a project without its owner on the roster.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use classhub_auth::{policy, Actor};
use classhub_core::error::{AppError, ErrorKind};
use classhub_core::AppResult;
use classhub_entity::project::{
    CreateProject, CreateProjectComment, JoinOutcome, JoinRequest, Project, ProjectComment,
    ProjectDeletion,
};
use classhub_entity::user::User;

use crate::store::ProjectStore;

/// Data access for projects, member sets, join requests, and comments.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Creates a repository bound to the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn create(&self, data: &CreateProject) -> AppResult<Project> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM classes WHERE id = $1")
            .bind(data.class_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find class", e))?
            .ok_or_else(|| AppError::not_found("class not found"))?;

        // Save-time rule: the owner must be an eligible common user. Both
        // the role label and the class's own admin set are consulted.
        let admins: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM class_admins WHERE class_id = $1",
        )
        .bind(data.class_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to load class admins", e)
        })?;

        let owner = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(data.owner_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to load project owner", e)
            })?
            .ok_or_else(|| AppError::not_found("owner not found"))?;
        policy::can_own_project(&Actor::from(&owner), &admins)?;

        let project = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (class_id, owner_id, name, description, folder_key) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(data.class_id)
        .bind(data.owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.folder_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("projects_folder_key_key") =>
            {
                AppError::conflict("project folder reference is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to create project", e),
        })?;

        // The owner is a member from the first moment.
        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
            .bind(project.id)
            .bind(project.owner_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to enroll project owner", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find project", e))
    }

    async fn list_for_class(&self, class_id: Uuid) -> AppResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE class_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list class projects", e)
        })
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            "SELECT DISTINCT p.* \
             FROM projects p \
             LEFT JOIN project_members m ON m.project_id = p.id \
             WHERE p.owner_id = $1 OR m.user_id = $1 \
             ORDER BY p.created_at DESC, p.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list user projects", e)
        })
    }

    async fn members(&self, project_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM project_members WHERE project_id = $1 ORDER BY user_id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list project members", e)
        })
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to check project membership", e)
        })
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find project", e))?
            .ok_or_else(|| AppError::not_found("project not found"))?;

        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("project_members_pkey") =>
                {
                    AppError::conflict("user is already a member of this project")
                }
                sqlx::Error::Database(ref db_err)
                    if db_err.constraint() == Some("project_members_user_id_fkey") =>
                {
                    AppError::not_found("user not found")
                }
                _ => AppError::with_source(ErrorKind::Database, "failed to add member", e),
            })?;

        Ok(())
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        let owner_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT owner_id FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock project", e))?
        .ok_or_else(|| AppError::not_found("project not found"))?;

        let result = sqlx::query(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to remove member", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user is not a member of this project"));
        }

        // Re-assert the owner before committing.
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to re-assert project owner", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(())
    }

    async fn replace_members(
        &self,
        project_id: Uuid,
        member_ids: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        let owner_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT owner_id FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock project", e))?
        .ok_or_else(|| AppError::not_found("project not found"))?;

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to clear project members", e)
            })?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id) \
             SELECT $1, unnest($2::uuid[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(member_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("project_members_user_id_fkey") =>
            {
                AppError::not_found("user named in member set not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to insert project members", e),
        })?;

        // The owner survives every wholesale replacement.
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to re-assert project owner", e)
        })?;

        let stored: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM project_members WHERE project_id = $1 ORDER BY user_id",
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to read back member set", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(stored)
    }

    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<JoinOutcome> {
        // The unique (project, user) pair turns a repeat request into a
        // no-op rather than an error.
        let result = sqlx::query(
            "INSERT INTO join_requests (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (project_id, user_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("join_requests_project_id_fkey") =>
            {
                AppError::not_found("project not found")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("join_requests_user_id_fkey") =>
            {
                AppError::not_found("user not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to create join request", e),
        })?;

        if result.rows_affected() == 1 {
            Ok(JoinOutcome::Requested)
        } else {
            Ok(JoinOutcome::AlreadyPending)
        }
    }

    async fn pending_requests(&self, project_id: Uuid) -> AppResult<Vec<JoinRequest>> {
        sqlx::query_as::<_, JoinRequest>(
            "SELECT * FROM join_requests WHERE project_id = $1 ORDER BY requested_at, id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list join requests", e)
        })
    }

    async fn approve_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        let owner_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT owner_id FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(project_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock project", e))?
        .ok_or_else(|| AppError::not_found("project not found"))?;

        // Consuming the request and enrolling the member commit together;
        // no interleaving can approve the same request twice.
        let consumed = sqlx::query(
            "DELETE FROM join_requests WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to consume join request", e)
        })?;

        if consumed.rows_affected() == 0 {
            return Err(AppError::not_found("no pending join request for this user"));
        }

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to enroll member", e))?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to re-assert project owner", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(())
    }

    async fn deny_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM join_requests WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to deny join request", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("no pending join request for this user"));
        }

        Ok(())
    }

    async fn delete(&self, project_id: Uuid) -> AppResult<ProjectDeletion> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        sqlx::query_scalar::<_, Uuid>("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to lock project", e))?
            .ok_or_else(|| AppError::not_found("project not found"))?;

        let blob_keys: Vec<String> = sqlx::query_scalar(
            "SELECT storage_key FROM documents WHERE project_id = $1 ORDER BY storage_key",
        )
        .bind(project_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to collect document keys", e)
        })?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to delete project", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(ProjectDeletion { blob_keys })
    }

    async fn add_comment(&self, data: &CreateProjectComment) -> AppResult<ProjectComment> {
        sqlx::query_as::<_, ProjectComment>(
            "INSERT INTO project_comments (project_id, author_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(data.project_id)
        .bind(data.author_id)
        .bind(&data.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("project_comments_project_id_fkey") =>
            {
                AppError::not_found("project not found")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("project_comments_author_id_fkey") =>
            {
                AppError::not_found("author not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to add project comment", e),
        })
    }

    async fn comments(&self, project_id: Uuid) -> AppResult<Vec<ProjectComment>> {
        sqlx::query_as::<_, ProjectComment>(
            "SELECT * FROM project_comments WHERE project_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list project comments", e)
        })
    }

    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<ProjectComment>> {
        sqlx::query_as::<_, ProjectComment>("SELECT * FROM project_comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to find project comment", e)
            })
    }

    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM project_comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to delete project comment", e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
