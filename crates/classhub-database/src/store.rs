//! Store traits implemented by every persistence backend.
//!
//! The service layer only ever talks to these traits, so the PostgreSQL
//! repositories and the in-memory store have to agree on semantics: which
//! operations are atomic, which error kinds come back for which failures,
//! and which consistency rules are re-asserted at write time. Those
//! contracts are spelled out on the methods below.

use async_trait::async_trait;
use uuid::Uuid;

use classhub_core::AppResult;
use classhub_entity::class::{AdminSetUpdate, Class, ClassDeletion, CreateClass};
use classhub_entity::document::{
    CreateDocument, CreateDocumentComment, Document, DocumentComment, LikeToggle, Tag,
};
use classhub_entity::project::{
    CreateProject, CreateProjectComment, JoinOutcome, JoinRequest, Project, ProjectComment,
    ProjectDeletion,
};
use classhub_entity::user::{CreateUser, UpdateProfile, User};

/// Account records and profile data.
#[async_trait]
pub trait UserStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new account. Fails with `Conflict` when the username or
    /// computing id is already taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Looks an account up by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Looks an account up by username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Replaces the editable profile fields wholesale. `None` clears the
    /// corresponding column. Fails with `NotFound` when the account does
    /// not exist and `Conflict` when the computing id collides.
    async fn update_profile(&self, data: &UpdateProfile) -> AppResult<User>;

    /// Points the account at a new avatar blob and returns the key of the
    /// previous one, if any, so the caller can clean it up.
    async fn replace_avatar(&self, user_id: Uuid, avatar_key: &str) -> AppResult<Option<String>>;
}

/// Classes, their rosters, and the admin sets that drive role labels.
#[async_trait]
pub trait ClassStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new class after re-checking that the owner exists and is
    /// a superuser. Fails with `Conflict` when the code is already taken.
    async fn create(&self, data: &CreateClass) -> AppResult<Class>;

    /// Looks a class up by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Class>>;

    /// Looks a class up by its course code.
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Class>>;

    /// Lists every class, newest first.
    async fn list(&self) -> AppResult<Vec<Class>>;

    /// Returns the ids on the class roster.
    async fn members(&self, class_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Returns the ids in the class admin set.
    async fn admins(&self, class_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Whether the user sits in this class's admin set.
    async fn is_admin(&self, class_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Whether the user sits in the admin set of any class at all. This is
    /// the predicate the role label is materialized from.
    async fn is_admin_anywhere(&self, user_id: Uuid) -> AppResult<bool>;

    /// Replaces the class roster wholesale.
    async fn replace_members(&self, class_id: Uuid, member_ids: &[Uuid]) -> AppResult<()>;

    /// Replaces the class admin set wholesale and, in the same transaction,
    /// recomputes the stored role label of every user who entered or left
    /// the set. Fails with `NotFound` when the class or any listed user
    /// does not exist.
    async fn replace_admins(&self, class_id: Uuid, admin_ids: &[Uuid])
        -> AppResult<AdminSetUpdate>;

    /// Deletes the class along with its projects, documents, and comments.
    /// Role labels of the class's former admins are recomputed in the same
    /// transaction. Returns the storage keys of every document blob that
    /// went with it so the caller can clean them up.
    async fn delete(&self, class_id: Uuid) -> AppResult<ClassDeletion>;
}

/// Projects, their member sets, join requests, and discussion threads.
#[async_trait]
pub trait ProjectStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new project after re-checking that the owner is eligible
    /// (not a PMA Admin and not in the class's admin set), then enrolls
    /// the owner as the first member. Fails with `Conflict` when the
    /// folder key is already taken.
    async fn create(&self, data: &CreateProject) -> AppResult<Project>;

    /// Looks a project up by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>>;

    /// Lists the projects of one class, newest first.
    async fn list_for_class(&self, class_id: Uuid) -> AppResult<Vec<Project>>;

    /// Lists the projects a user owns or is a member of, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Project>>;

    /// Returns the ids in the project member set.
    async fn members(&self, project_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Whether the user is in the project member set.
    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Adds one member. Fails with `Conflict` when they are already in.
    async fn add_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Removes one member, then re-asserts the owner's membership in the
    /// same transaction. Fails with `NotFound` when the user was not a
    /// member to begin with.
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Replaces the member set wholesale. The owner is silently added back
    /// if the new set omits them. Returns the set actually stored.
    async fn replace_members(&self, project_id: Uuid, member_ids: &[Uuid])
        -> AppResult<Vec<Uuid>>;

    /// Files a join request. A repeat request from the same user is not an
    /// error; it reports [`JoinOutcome::AlreadyPending`] instead.
    async fn create_join_request(&self, project_id: Uuid, user_id: Uuid)
        -> AppResult<JoinOutcome>;

    /// Lists the pending join requests of a project, oldest first.
    async fn pending_requests(&self, project_id: Uuid) -> AppResult<Vec<JoinRequest>>;

    /// Consumes a pending request and enrolls the requester, atomically.
    /// Fails with `NotFound` when no pending request exists.
    async fn approve_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Discards a pending request without enrolling the requester. Fails
    /// with `NotFound` when no pending request exists.
    async fn deny_join(&self, project_id: Uuid, user_id: Uuid) -> AppResult<()>;

    /// Deletes the project along with its documents, requests, and
    /// comments. Returns the storage keys of the documents that went with
    /// it so the caller can clean the blobs up.
    async fn delete(&self, project_id: Uuid) -> AppResult<ProjectDeletion>;

    /// Appends a comment to the project thread.
    async fn add_comment(&self, data: &CreateProjectComment) -> AppResult<ProjectComment>;

    /// Lists a project's comments, newest first.
    async fn comments(&self, project_id: Uuid) -> AppResult<Vec<ProjectComment>>;

    /// Looks a project comment up by id.
    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<ProjectComment>>;

    /// Deletes a project comment. Returns whether a row was removed.
    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool>;
}

/// Document records, tags, and per-document engagement.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Inserts a document record and links its tags, creating missing tag
    /// rows on the fly, all in one transaction. Fails with `Conflict` when
    /// the storage key is already taken.
    async fn create(&self, data: &CreateDocument) -> AppResult<Document>;

    /// Looks a document up by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// Lists the documents of one project, newest first.
    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Document>>;

    /// Returns a document's tags sorted by name.
    async fn tags_for(&self, document_id: Uuid) -> AppResult<Vec<Tag>>;

    /// Adds one to the view counter and returns the new total. Fails with
    /// `NotFound` when the document does not exist.
    async fn increment_views(&self, document_id: Uuid) -> AppResult<i64>;

    /// Flips the user's like on the document and adjusts the counter in
    /// the same transaction. Returns which way it flipped plus the new
    /// total. Fails with `NotFound` when the document does not exist.
    async fn toggle_like(&self, document_id: Uuid, user_id: Uuid) -> AppResult<LikeToggle>;

    /// Whether the user currently likes the document.
    async fn is_liked_by(&self, document_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Appends a comment to the document thread.
    async fn add_comment(&self, data: &CreateDocumentComment) -> AppResult<DocumentComment>;

    /// Lists a document's comments, newest first.
    async fn comments(&self, document_id: Uuid) -> AppResult<Vec<DocumentComment>>;

    /// Looks a document comment up by id.
    async fn find_comment(&self, comment_id: Uuid) -> AppResult<Option<DocumentComment>>;

    /// Deletes a document comment. Returns whether a row was removed.
    async fn delete_comment(&self, comment_id: Uuid) -> AppResult<bool>;

    /// Deletes the document record along with its comments, likes, and tag
    /// links. Returns whether a row was removed. Blob removal is the
    /// caller's job and happens before this.
    async fn delete(&self, document_id: Uuid) -> AppResult<bool>;

    /// Case-insensitive substring search over title and tag names, scoped
    /// to projects the user owns or is a member of. Results are distinct
    /// and ordered by document id so repeated searches line up.
    async fn search(&self, user_id: Uuid, query: &str) -> AppResult<Vec<Document>>;
}
