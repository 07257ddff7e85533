//! Facade wiring stores, blob storage, and services together.

use std::sync::Arc;

use tracing::info;

use classhub_core::config::AppConfig;
use classhub_core::config::storage::StorageConfig;
use classhub_core::error::AppError;
use classhub_core::traits::blob::BlobStore;
use classhub_database::postgres::{
    ClassRepository, DocumentRepository, ProjectRepository, UserRepository,
};
use classhub_database::{
    ClassStore, DatabasePool, DocumentStore, MemoryStore, ProjectStore, UserStore,
};
use classhub_service::{
    ClassService, DocumentService, EngagementService, MembershipService, ProjectService,
    SearchService, UserService,
};
use classhub_storage::{LocalBlobStore, MemoryBlobStore};

/// The assembled ClassHub application.
///
/// Owns one service per domain area, all sharing the same store backend
/// and blob store. Build one with [`ClassHub::connect`] for PostgreSQL
/// or [`ClassHub::in_memory`] for tests and embedded use. Cloning is
/// cheap; every service is a bundle of `Arc` handles.
#[derive(Debug, Clone)]
pub struct ClassHub {
    /// Account registration and profiles.
    pub users: UserService,
    /// Class administration, rosters, and admin sets.
    pub classes: ClassService,
    /// Project lifecycle and project comments.
    pub projects: ProjectService,
    /// Project member sets and join requests.
    pub membership: MembershipService,
    /// Document records and the files behind them.
    pub documents: DocumentService,
    /// Views, likes, and document comments.
    pub engagement: EngagementService,
    /// Access-scoped document search.
    pub search: SearchService,
}

impl ClassHub {
    /// Connects to PostgreSQL, runs pending migrations, and wires every
    /// service against the configured blob store.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        classhub_database::migration::run_migrations(pool.pool()).await?;

        let blobs: Arc<dyn BlobStore> = match config.storage.provider.as_str() {
            "local" => Arc::new(LocalBlobStore::new(&config.storage.local.root_path).await?),
            "memory" => Arc::new(MemoryBlobStore::new()),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider '{other}'"
                )));
            }
        };

        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.pool().clone()));
        let classes: Arc<dyn ClassStore> = Arc::new(ClassRepository::new(pool.pool().clone()));
        let projects: Arc<dyn ProjectStore> = Arc::new(ProjectRepository::new(pool.pool().clone()));
        let documents: Arc<dyn DocumentStore> =
            Arc::new(DocumentRepository::new(pool.pool().clone()));

        info!(provider = %config.storage.provider, "ClassHub services wired");

        Ok(Self::assemble(
            users,
            classes,
            projects,
            documents,
            blobs,
            config.storage.max_upload_size_bytes,
        ))
    }

    /// Builds a fully in-memory hub: mutex-guarded store, memory blobs.
    ///
    /// Nothing survives the value. Intended for tests and embedded use.
    pub fn in_memory() -> Self {
        Self::in_memory_with_upload_limit(StorageConfig::default().max_upload_size_bytes)
    }

    /// Builds an in-memory hub with a custom upload size limit.
    pub fn in_memory_with_upload_limit(max_upload_size_bytes: u64) -> Self {
        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let classes: Arc<dyn ClassStore> = store.clone();
        let projects: Arc<dyn ProjectStore> = store.clone();
        let documents: Arc<dyn DocumentStore> = store;
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());

        Self::assemble(
            users,
            classes,
            projects,
            documents,
            blobs,
            max_upload_size_bytes,
        )
    }

    fn assemble(
        users: Arc<dyn UserStore>,
        classes: Arc<dyn ClassStore>,
        projects: Arc<dyn ProjectStore>,
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        max_upload_size_bytes: u64,
    ) -> Self {
        Self {
            users: UserService::new(users.clone(), blobs.clone(), max_upload_size_bytes),
            classes: ClassService::new(classes.clone(), users.clone(), blobs.clone()),
            projects: ProjectService::new(projects.clone(), classes.clone(), blobs.clone()),
            membership: MembershipService::new(projects.clone(), users),
            documents: DocumentService::new(
                documents.clone(),
                projects.clone(),
                classes,
                blobs,
                max_upload_size_bytes,
            ),
            engagement: EngagementService::new(documents.clone(), projects),
            search: SearchService::new(documents),
        }
    }
}
