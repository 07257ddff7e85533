//! Tables and cascade helpers behind the in-memory store.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use uuid::Uuid;

use classhub_entity::class::Class;
use classhub_entity::document::{Document, DocumentComment, Like, Tag};
use classhub_entity::project::{JoinRequest, Project, ProjectComment};
use classhub_entity::user::{RoleChange, User};

/// Every table of the in-memory backend.
///
/// Member and admin sets are `BTreeSet`s so listings come out in id
/// order without extra sorting, matching the SQL `ORDER BY user_id`.
#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub users: HashMap<Uuid, User>,
    pub classes: HashMap<Uuid, Class>,
    pub class_members: HashMap<Uuid, BTreeSet<Uuid>>,
    pub class_admins: HashMap<Uuid, BTreeSet<Uuid>>,
    pub projects: HashMap<Uuid, Project>,
    pub project_members: HashMap<Uuid, BTreeSet<Uuid>>,
    pub join_requests: HashMap<Uuid, JoinRequest>,
    pub project_comments: HashMap<Uuid, ProjectComment>,
    pub documents: HashMap<Uuid, Document>,
    pub tags: HashMap<Uuid, Tag>,
    pub document_tags: HashMap<Uuid, BTreeSet<Uuid>>,
    pub document_comments: HashMap<Uuid, DocumentComment>,
    pub likes: HashMap<(Uuid, Uuid), Like>,
}

impl MemoryState {
    /// Whether the user sits in any class's admin set.
    pub fn is_admin_anywhere(&self, user_id: Uuid) -> bool {
        self.class_admins.values().any(|s| s.contains(&user_id))
    }

    /// Rewrites one user's role label from the current admin-set state.
    /// Returns `None` when no such user exists.
    pub fn recompute_role(&mut self, user_id: Uuid) -> Option<RoleChange> {
        let is_admin = self.is_admin_anywhere(user_id);
        let user = self.users.get_mut(&user_id)?;
        user.role = user.role.materialized(is_admin);
        user.updated_at = Utc::now();
        Some(RoleChange {
            user_id,
            role: user.role,
        })
    }

    /// Drops a document row and everything hanging off it.
    pub fn delete_document_rows(&mut self, document_id: Uuid) -> bool {
        if self.documents.remove(&document_id).is_none() {
            return false;
        }
        self.document_tags.remove(&document_id);
        self.document_comments
            .retain(|_, c| c.document_id != document_id);
        self.likes.retain(|(doc, _), _| *doc != document_id);
        true
    }

    /// Drops a project row and everything hanging off it, returning the
    /// storage keys of the documents that went with it.
    pub fn delete_project_rows(&mut self, project_id: Uuid) -> Vec<String> {
        let doc_ids: Vec<Uuid> = self
            .documents
            .values()
            .filter(|d| d.project_id == project_id)
            .map(|d| d.id)
            .collect();

        let mut blob_keys: Vec<String> = self
            .documents
            .values()
            .filter(|d| d.project_id == project_id)
            .map(|d| d.storage_key.clone())
            .collect();
        blob_keys.sort();

        for doc_id in doc_ids {
            self.delete_document_rows(doc_id);
        }

        self.project_members.remove(&project_id);
        self.join_requests.retain(|_, r| r.project_id != project_id);
        self.project_comments
            .retain(|_, c| c.project_id != project_id);
        self.projects.remove(&project_id);

        blob_keys
    }
}
