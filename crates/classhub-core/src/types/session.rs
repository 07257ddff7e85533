//! Session-scoped view tracking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The set of document ids already viewed within one session.
///
/// ClassHub counts a document view at most once per session. The session
/// itself (cookie, token, connection) belongs to the caller; the caller
/// keeps one `SessionViews` per session, passes it into every view-counting
/// call, and persists it however its session machinery persists values.
/// The serialized form is a plain JSON array of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionViews {
    viewed: HashSet<Uuid>,
}

impl SessionViews {
    /// Create an empty view set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document id as viewed.
    ///
    /// Returns `true` the first time an id is seen in this session and
    /// `false` for every repeat, which is what makes the view counter
    /// idempotent per session.
    pub fn mark_viewed(&mut self, document_id: Uuid) -> bool {
        self.viewed.insert(document_id)
    }

    /// Check whether a document id was already viewed in this session.
    pub fn has_viewed(&self, document_id: Uuid) -> bool {
        self.viewed.contains(&document_id)
    }

    /// Number of distinct documents viewed in this session.
    pub fn len(&self) -> usize {
        self.viewed.len()
    }

    /// Whether no document has been viewed yet.
    pub fn is_empty(&self) -> bool {
        self.viewed.is_empty()
    }
}
