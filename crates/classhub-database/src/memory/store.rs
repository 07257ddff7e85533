//! The in-memory store.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use classhub_auth::{policy, Actor};
use classhub_core::{AppError, AppResult};
use classhub_entity::class::{AdminSetUpdate, Class, ClassDeletion, CreateClass};
use classhub_entity::document::{
    CreateDocument, CreateDocumentComment, Document, DocumentComment, Like, LikeOutcome,
    LikeToggle, Tag,
};
use classhub_entity::project::{
    CreateProject, CreateProjectComment, JoinOutcome, JoinRequest, Project, ProjectComment,
    ProjectDeletion,
};
use classhub_entity::user::{CreateUser, UpdateProfile, User, UserRole};

use super::state::MemoryState;
use crate::store::{ClassStore, DocumentStore, ProjectStore, UserStore};

/// A complete storage backend held in process memory.
///
/// One mutex guards all tables, so every operation is serialized.
/// Semantics mirror the PostgreSQL repositories: same error kinds and
/// messages, same orderings, same cascades, same role recompute.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state, recovering from a poisoned mutex.
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut state = self.state();

        if state.users.values().any(|u| u.username == data.username) {
            return Err(AppError::conflict("username is already taken"));
        }
        if let Some(cid) = &data.computing_id {
            if state
                .users
                .values()
                .any(|u| u.computing_id.as_deref() == Some(cid.as_str()))
            {
                return Err(AppError::conflict("computing id is already taken"));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: data.username.clone(),
            email: data.email.clone(),
            display_name: data.display_name.clone(),
            is_superuser: data.is_superuser,
            role: UserRole::Common,
            computing_id: data.computing_id.clone(),
            major: None,
            year: None,
            bio: None,
            avatar_key: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User> {
        let mut state = self.state();

        if let Some(cid) = &data.computing_id {
            if state
                .users
                .values()
                .any(|u| u.id != data.id && u.computing_id.as_deref() == Some(cid.as_str()))
            {
                return Err(AppError::conflict("computing id is already taken"));
            }
        }

        let user = state
            .users
            .get_mut(&data.id)
            .ok_or_else(|| AppError::not_found("user not found"))?;

        user.email = data.email.clone();
        user.display_name = data.display_name.clone();
        user.computing_id = data.computing_id.clone();
        user.major = data.major.clone();
        user.year = data.year;
        user.bio = data.bio.clone();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn replace_avatar(&self, user_id: Uuid, avatar_key: &str) -> AppResult<Option<String>> {
        let mut state = self.state();
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user not found"))?;

        let previous = user.avatar_key.replace(avatar_key.to_string());
        user.updated_at = Utc::now();
        Ok(previous)
    }
}

#[async_trait]
impl ClassStore for MemoryStore {
    async fn create(&self, data: &CreateClass) -> AppResult<Class> {
        let mut state = self.state();

        let owner = state
            .users
            .get(&data.owner_id)
            .ok_or_else(|| AppError::not_found("owner not found"))?;
        policy::can_own_class(&Actor::from(owner))?;

        if state.classes.values().any(|c| c.code == data.code) {
            return Err(AppError::conflict("class code is already taken"));
        }

        let now = Utc::now();
        let class = Class {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            code: data.code.clone(),
            name: data.name.clone(),
            description: data.description.clone(),
            created_at: now,
            updated_at: now,
        };
        state.class_members.insert(class.id, BTreeSet::new());
        state.class_admins.insert(class.id, BTreeSet::new());
        state.classes.insert(class.id, class.clone());
        Ok(class)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Class>> {
        Ok(self.state().classes.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Class>> {
        Ok(self
            .state()
            .classes
            .values()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Class>> {
        let mut classes: Vec<Class> = self.state().classes.values().cloned().collect();
        classes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(classes)
    }

    async fn members(&self, class_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .class_members
            .get(&class_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn admins(&self, class_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .class_admins
            .get(&class_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn is_admin(&self, class_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state()
            .class_admins
            .get(&class_id)
            .map(|s| s.contains(&user_id))
            .unwrap_or(false))
    }

    async fn is_admin_anywhere(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.state().is_admin_anywhere(user_id))
    }

    async fn replace_members(&self, class_id: Uuid, member_ids: &[Uuid]) -> AppResult<()> {
        let mut state = self.state();

        if !state.classes.contains_key(&class_id) {
            return Err(AppError::not_found("class not found"));
        }
        if member_ids.iter().any(|id| !state.users.contains_key(id)) {
            return Err(AppError::not_found("user named in member set not found"));
        }

        state
            .class_members
            .insert(class_id, member_ids.iter().copied().collect());
        Ok(())
    }

    async fn replace_admins(
        &self,
        class_id: Uuid,
        admin_ids: &[Uuid],
    ) -> AppResult<AdminSetUpdate> {
        let mut state = self.state();

        if !state.classes.contains_key(&class_id) {
            return Err(AppError::not_found("class not found"));
        }

        let current: BTreeSet<Uuid> = state
            .class_admins
            .get(&class_id)
            .cloned()
            .unwrap_or_default();
        let desired: BTreeSet<Uuid> = admin_ids.iter().copied().collect();

        let added: Vec<Uuid> = desired.difference(&current).copied().collect();
        let removed: Vec<Uuid> = current.difference(&desired).copied().collect();

        if added.is_empty() && removed.is_empty() {
            return Ok(AdminSetUpdate {
                added,
                removed,
                role_changes: Vec::new(),
            });
        }

        if added.iter().any(|id| !state.users.contains_key(id)) {
            return Err(AppError::not_found("user named in admin set not found"));
        }

        state.class_admins.insert(class_id, desired);

        let mut affected: Vec<Uuid> = added.iter().chain(removed.iter()).copied().collect();
        affected.sort_unstable();
        let role_changes = affected
            .iter()
            .filter_map(|id| state.recompute_role(*id))
            .collect();

        Ok(AdminSetUpdate {
            added,
            removed,
            role_changes,
        })
    }

    async fn delete(&self, class_id: Uuid) -> AppResult<ClassDeletion> {
        let mut state = self.state();

        if !state.classes.contains_key(&class_id) {
            return Err(AppError::not_found("class not found"));
        }

        let former_admins: Vec<Uuid> = state
            .class_admins
            .get(&class_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();

        let project_ids: Vec<Uuid> = state
            .projects
            .values()
            .filter(|p| p.class_id == class_id)
            .map(|p| p.id)
            .collect();

        let mut blob_keys = Vec::new();
        for project_id in project_ids {
            blob_keys.extend(state.delete_project_rows(project_id));
        }
        blob_keys.sort();

        state.class_members.remove(&class_id);
        state.class_admins.remove(&class_id);
        state.classes.remove(&class_id);

        // With this class's admin set gone, former admins keep the label
        // only if some other class still lists them.
        let role_changes = former_admins
            .iter()
            .filter_map(|id| state.recompute_role(*id))
            .collect();

        Ok(ClassDeletion {
            role_changes,
            blob_keys,
        })
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create(&self, data: &CreateProject) -> AppResult<Project> {
        let mut state = self.state();

        if !state.classes.contains_key(&data.class_id) {
            return Err(AppError::not_found("class not found"));
        }

        let admins: Vec<Uuid> = state
            .class_admins
            .get(&data.class_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();

        let owner = state
            .users
            .get(&data.owner_id)
            .ok_or_else(|| AppError::not_found("owner not found"))?;
        policy::can_own_project(&Actor::from(owner), &admins)?;

        if state
            .projects
            .values()
            .any(|p| p.folder_key == data.folder_key)
        {
            return Err(AppError::conflict("project folder reference is already taken"));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            class_id: data.class_id,
            owner_id: data.owner_id,
            name: data.name.clone(),
            description: data.description.clone(),
            folder_key: data.folder_key.clone(),
            created_at: now,
            updated_at: now,
        };
        state
            .project_members
            .insert(project.id, BTreeSet::from([project.owner_id]));
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        Ok(self.state().projects.get(&id).cloned())
    }

    async fn list_for_class(&self, class_id: Uuid) -> AppResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .state()
            .projects
            .values()
            .filter(|p| p.class_id == class_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Project>> {
        let state = self.state();
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| {
                p.owner_id == user_id
                    || state
                        .project_members
                        .get(&p.id)
                        .map(|m| m.contains(&user_id))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn members(&self, project_id: Uuid) -> AppResult<Vec<Uuid>> {
        Ok(self
            .state()
            .project_members
            .get(&project_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .state()
            .project_members
            .get(&project_id)
            .map(|s| s.contains(&user_id))
            .unwrap_or(false))
    }

    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state();

        if !state.projects.contains_key(&project_id) {
            return Err(AppError::not_found("project not found"));
        }
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found("user not found"));
        }

        let members = state.project_members.entry(project_id).or_default();
        if !members.insert(user_id) {
            return Err(AppError::conflict("user is already a member of this project"));
        }
        Ok(())
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state();

        let owner_id = state
            .projects
            .get(&project_id)
            .map(|p| p.owner_id)
            .ok_or_else(|| AppError::not_found("project not found"))?;

        let members = state.project_members.entry(project_id).or_default();
        if !members.remove(&user_id) {
            return Err(AppError::not_found("user is not a member of this project"));
        }

        // The owner survives every removal.
        members.insert(owner_id);
        Ok(())
    }

    async fn replace_members(
        &self,
        project_id: Uuid,
        member_ids: &[Uuid],
    ) -> AppResult<Vec<Uuid>> {
        let mut state = self.state();

        let owner_id = state
            .projects
            .get(&project_id)
            .map(|p| p.owner_id)
            .ok_or_else(|| AppError::not_found("project not found"))?;

        if member_ids.iter().any(|id| !state.users.contains_key(id)) {
            return Err(AppError::not_found("user named in member set not found"));
        }

        let mut set: BTreeSet<Uuid> = member_ids.iter().copied().collect();
        set.insert(owner_id);
        let stored: Vec<Uuid> = set.iter().copied().collect();
        state.project_members.insert(project_id, set);
        Ok(stored)
    }

    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<JoinOutcome> {
        let mut state = self.state();

        if !state.projects.contains_key(&project_id) {
            return Err(AppError::not_found("project not found"));
        }
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found("user not found"));
        }

        let already_pending = state
            .join_requests
            .values()
            .any(|r| r.project_id == project_id && r.user_id == user_id);
        if already_pending {
            return Ok(JoinOutcome::AlreadyPending);
        }

        let request = JoinRequest {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            approved: false,
            requested_at: Utc::now(),
        };
        state.join_requests.insert(request.id, request);
        Ok(JoinOutcome::Requested)
    }

    async fn pending_requests(&self, project_id: Uuid) -> AppResult<Vec<JoinRequest>> {
        let mut requests: Vec<JoinRequest> = self
            .state()
            .join_requests
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));
        Ok(requests)
    }

    async fn approve_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state();

        let owner_id = state
            .projects
            .get(&project_id)
            .map(|p| p.owner_id)
            .ok_or_else(|| AppError::not_found("project not found"))?;

        let request_id = state
            .join_requests
            .values()
            .find(|r| r.project_id == project_id && r.user_id == user_id)
            .map(|r| r.id)
            .ok_or_else(|| AppError::not_found("no pending join request for this user"))?;

        state.join_requests.remove(&request_id);

        let members = state.project_members.entry(project_id).or_default();
        members.insert(user_id);
        members.insert(owner_id);
        Ok(())
    }

    async fn deny_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut state = self.state();

        let request_id = state
            .join_requests
            .values()
            .find(|r| r.project_id == project_id && r.user_id == user_id)
            .map(|r| r.id)
            .ok_or_else(|| AppError::not_found("no pending join request for this user"))?;

        state.join_requests.remove(&request_id);
        Ok(())
    }

    async fn delete(&self, project_id: Uuid) -> AppResult<ProjectDeletion> {
        let mut state = self.state();

        if !state.projects.contains_key(&project_id) {
            return Err(AppError::not_found("project not found"));
        }

        let blob_keys = state.delete_project_rows(project_id);
        Ok(ProjectDeletion { blob_keys })
    }

    async fn add_comment(&self, data: &CreateProjectComment) -> AppResult<ProjectComment> {
        let mut state = self.state();

        if !state.projects.contains_key(&data.project_id) {
            return Err(AppError::not_found("project not found"));
        }
        if !state.users.contains_key(&data.author_id) {
            return Err(AppError::not_found("author not found"));
        }

        let now = Utc::now();
        let comment = ProjectComment {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            author_id: data.author_id,
            content: data.content.clone(),
            created_at: now,
            updated_at: now,
        };
        state.project_comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments(&self, project_id: Uuid) -> AppResult<Vec<ProjectComment>> {
        let mut comments: Vec<ProjectComment> = self
            .state()
            .project_comments
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<ProjectComment>> {
        Ok(self.state().project_comments.get(&comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool> {
        Ok(self.state().project_comments.remove(&comment_id).is_some())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, data: &CreateDocument) -> AppResult<Document> {
        let mut state = self.state();

        if !state.projects.contains_key(&data.project_id) {
            return Err(AppError::not_found("project not found"));
        }
        if !state.users.contains_key(&data.owner_id) {
            return Err(AppError::not_found("owner not found"));
        }
        if state
            .documents
            .values()
            .any(|d| d.storage_key == data.storage_key)
        {
            return Err(AppError::conflict(
                "a document with this file name already exists in the project",
            ));
        }

        let document = Document {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            owner_id: data.owner_id,
            title: data.title.clone(),
            storage_key: data.storage_key.clone(),
            description: data.description.clone(),
            due_date: data.due_date,
            views: 0,
            likes: 0,
            uploaded_at: Utc::now(),
        };

        let mut tag_ids = BTreeSet::new();
        for name in &data.tags {
            let existing = state.tags.values().find(|t| &t.name == name).map(|t| t.id);
            let tag_id = match existing {
                Some(id) => id,
                None => {
                    let tag = Tag {
                        id: Uuid::new_v4(),
                        name: name.clone(),
                    };
                    let id = tag.id;
                    state.tags.insert(id, tag);
                    id
                }
            };
            tag_ids.insert(tag_id);
        }

        state.document_tags.insert(document.id, tag_ids);
        state.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.state().documents.get(&id).cloned())
    }

    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .state()
            .documents
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(a.id.cmp(&b.id)));
        Ok(documents)
    }

    async fn tags_for(&self, document_id: Uuid) -> AppResult<Vec<Tag>> {
        let state = self.state();
        let mut tags: Vec<Tag> = state
            .document_tags
            .get(&document_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tags.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn increment_views(&self, document_id: Uuid) -> AppResult<i64> {
        let mut state = self.state();
        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| AppError::not_found("document not found"))?;
        document.views += 1;
        Ok(document.views)
    }

    async fn toggle_like(&self, document_id: Uuid, user_id: Uuid) -> AppResult<LikeToggle> {
        let mut state = self.state();

        if !state.documents.contains_key(&document_id) {
            return Err(AppError::not_found("document not found"));
        }
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found("user not found"));
        }

        let key = (document_id, user_id);
        let outcome = if state.likes.remove(&key).is_some() {
            LikeOutcome::Unliked
        } else {
            state.likes.insert(
                key,
                Like {
                    document_id,
                    user_id,
                    liked_at: Utc::now(),
                },
            );
            LikeOutcome::Liked
        };

        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| AppError::not_found("document not found"))?;
        match outcome {
            LikeOutcome::Liked => document.likes += 1,
            LikeOutcome::Unliked => document.likes -= 1,
        }

        Ok(LikeToggle {
            outcome,
            likes: document.likes,
        })
    }

    async fn is_liked_by(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        Ok(self.state().likes.contains_key(&(document_id, user_id)))
    }

    async fn add_comment(&self, data: &CreateDocumentComment) -> AppResult<DocumentComment> {
        let mut state = self.state();

        if !state.documents.contains_key(&data.document_id) {
            return Err(AppError::not_found("document not found"));
        }
        if !state.users.contains_key(&data.author_id) {
            return Err(AppError::not_found("author not found"));
        }

        let now = Utc::now();
        let comment = DocumentComment {
            id: Uuid::new_v4(),
            document_id: data.document_id,
            author_id: data.author_id,
            content: data.content.clone(),
            created_at: now,
            updated_at: now,
        };
        state.document_comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments(&self, document_id: Uuid) -> AppResult<Vec<DocumentComment>> {
        let mut comments: Vec<DocumentComment> = self
            .state()
            .document_comments
            .values()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<DocumentComment>> {
        Ok(self.state().document_comments.get(&comment_id).cloned())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool> {
        Ok(self.state().document_comments.remove(&comment_id).is_some())
    }

    async fn delete(&self, document_id: Uuid) -> AppResult<bool> {
        Ok(self.state().delete_document_rows(document_id))
    }

    async fn search(&self, user_id: Uuid, query: &str) -> AppResult<Vec<Document>> {
        let state = self.state();
        let needle = query.to_lowercase();

        let accessible: BTreeSet<Uuid> = state
            .projects
            .values()
            .filter(|p| {
                p.owner_id == user_id
                    || state
                        .project_members
                        .get(&p.id)
                        .map(|m| m.contains(&user_id))
                        .unwrap_or(false)
            })
            .map(|p| p.id)
            .collect();

        let mut hits: Vec<Document> = state
            .documents
            .values()
            .filter(|d| {
                if !accessible.contains(&d.project_id) {
                    return false;
                }
                if d.title.to_lowercase().contains(&needle) {
                    return true;
                }
                // Tag names are stored normalized, so a plain contains
                // works against the lowercased needle.
                state
                    .document_tags
                    .get(&d.id)
                    .map(|ids| {
                        ids.iter().any(|tid| {
                            state
                                .tags
                                .get(tid)
                                .map(|t| t.name.contains(&needle))
                                .unwrap_or(false)
                        })
                    })
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        hits.sort_by_key(|d| d.id);
        Ok(hits)
    }
}
