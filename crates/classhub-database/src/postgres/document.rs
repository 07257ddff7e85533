//! Document repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::AppResult;
use classhub_entity::document::{
    CreateDocument, CreateDocumentComment, Document, DocumentComment, LikeOutcome, LikeToggle,
    Tag,
};

use crate::store::DocumentStore;

/// Data access for documents, tags, comments, and likes.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    /// Creates a repository bound to the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds an ILIKE pattern for a substring search, escaping the wildcard
/// characters so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl DocumentStore for DocumentRepository {
    async fn create(&self, data: &CreateDocument) -> AppResult<Document> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        let document = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (project_id, owner_id, title, storage_key, description, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(data.project_id)
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.storage_key)
        .bind(&data.description)
        .bind(data.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("documents_storage_key_key") =>
            {
                AppError::conflict("a document with this file name already exists in the project")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("documents_project_id_fkey") =>
            {
                AppError::not_found("project not found")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("documents_owner_id_fkey") =>
            {
                AppError::not_found("owner not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to create document", e),
        })?;

        // Get-or-create each tag and link it. The upsert returns the row
        // id in both cases.
        for name in &data.tags {
            let tag_id = sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO tags (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to get or create tag", e)
            })?;

            sqlx::query(
                "INSERT INTO document_tags (document_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(document.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to link tag", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to find document", e))
    }

    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE project_id = $1 ORDER BY uploaded_at DESC, id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list project documents", e)
        })
    }

    async fn tags_for(&self, document_id: Uuid) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.* \
             FROM tags t \
             INNER JOIN document_tags dt ON dt.tag_id = t.id \
             WHERE dt.document_id = $1 \
             ORDER BY t.name",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list document tags", e)
        })
    }

    async fn increment_views(&self, document_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE documents SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to increment views", e)
        })?
        .ok_or_else(|| AppError::not_found("document not found"))
    }

    async fn toggle_like(&self, document_id: Uuid, user_id: Uuid) -> AppResult<LikeToggle> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to begin transaction", e)
        })?;

        // Try the like first; the unique (document, user) pair tells us
        // which way the toggle goes. Concurrent toggles serialize on the
        // like row itself.
        let inserted = sqlx::query(
            "INSERT INTO document_likes (document_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(document_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("document_likes_document_id_fkey") =>
            {
                AppError::not_found("document not found")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("document_likes_user_id_fkey") =>
            {
                AppError::not_found("user not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to record like", e),
        })?;

        let toggle = if inserted.rows_affected() == 1 {
            let likes = sqlx::query_scalar::<_, i64>(
                "UPDATE documents SET likes = likes + 1 WHERE id = $1 RETURNING likes",
            )
            .bind(document_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to increment likes", e)
            })?
            .ok_or_else(|| AppError::not_found("document not found"))?;

            LikeToggle {
                outcome: LikeOutcome::Liked,
                likes,
            }
        } else {
            let removed = sqlx::query(
                "DELETE FROM document_likes WHERE document_id = $1 AND user_id = $2",
            )
            .bind(document_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to remove like", e)
            })?;

            if removed.rows_affected() == 0 {
                return Err(AppError::internal("like row vanished during toggle"));
            }

            let likes = sqlx::query_scalar::<_, i64>(
                "UPDATE documents SET likes = likes - 1 WHERE id = $1 RETURNING likes",
            )
            .bind(document_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to decrement likes", e)
            })?
            .ok_or_else(|| AppError::not_found("document not found"))?;

            LikeToggle {
                outcome: LikeOutcome::Unliked,
                likes,
            }
        };

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to commit transaction", e)
        })?;

        Ok(toggle)
    }

    async fn is_liked_by(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM document_likes WHERE document_id = $1 AND user_id = $2)",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to check like", e))
    }

    async fn add_comment(&self, data: &CreateDocumentComment) -> AppResult<DocumentComment> {
        sqlx::query_as::<_, DocumentComment>(
            "INSERT INTO document_comments (document_id, author_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(data.document_id)
        .bind(data.author_id)
        .bind(&data.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("document_comments_document_id_fkey") =>
            {
                AppError::not_found("document not found")
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("document_comments_author_id_fkey") =>
            {
                AppError::not_found("author not found")
            }
            _ => AppError::with_source(ErrorKind::Database, "failed to add document comment", e),
        })
    }

    async fn comments(&self, document_id: Uuid) -> AppResult<Vec<DocumentComment>> {
        sqlx::query_as::<_, DocumentComment>(
            "SELECT * FROM document_comments WHERE document_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to list document comments", e)
        })
    }

    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<DocumentComment>> {
        sqlx::query_as::<_, DocumentComment>("SELECT * FROM document_comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to find document comment", e)
            })
    }

    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM document_comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to delete document comment", e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, document_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "failed to delete document", e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, user_id: Uuid, query: &str) -> AppResult<Vec<Document>> {
        let pattern = like_pattern(query);

        sqlx::query_as::<_, Document>(
            "SELECT DISTINCT d.* \
             FROM documents d \
             INNER JOIN projects p ON d.project_id = p.id \
             LEFT JOIN project_members m ON m.project_id = p.id \
             LEFT JOIN document_tags dt ON dt.document_id = d.id \
             LEFT JOIN tags t ON t.id = dt.tag_id \
             WHERE (p.owner_id = $1 OR m.user_id = $1) \
               AND (d.title ILIKE $2 OR t.name ILIKE $2) \
             ORDER BY d.id",
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "failed to search documents", e)
        })
    }
}
