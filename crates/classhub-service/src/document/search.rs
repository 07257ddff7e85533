//! Access-scoped document search.

use std::sync::Arc;

use classhub_auth::policy;
use classhub_core::error::AppError;
use classhub_database::DocumentStore;
use classhub_entity::document::Document;

use crate::context::RequestContext;

/// Case-insensitive search over document titles and tag names, scoped
/// to the caller's projects.
#[derive(Debug, Clone)]
pub struct SearchService {
    /// Document store.
    documents: Arc<dyn DocumentStore>,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Searches the caller's documents by title and tag substring.
    ///
    /// A blank query matches nothing. Results only ever come from
    /// projects the caller owns or is a member of, so two users issuing
    /// the same query can see different documents.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        query: &str,
    ) -> Result<Vec<Document>, AppError> {
        policy::require_authenticated(&ctx.actor)?;

        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.documents.search(ctx.user_id(), query).await
    }
}
