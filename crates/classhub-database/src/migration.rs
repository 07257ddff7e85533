//! Schema migrations.

use sqlx::PgPool;
use tracing::info;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::AppResult;

/// Applies any pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    info!("running database migrations");
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "failed to run migrations", e))?;
    info!("database migrations complete");
    Ok(())
}
