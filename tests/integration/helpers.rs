//! Shared test helpers for integration tests.

use bytes::Bytes;
use uuid::Uuid;

use classhub::class::Class;
use classhub::document::Document;
use classhub::hub::ClassHub;
use classhub::project::Project;
use classhub::user::User;
use classhub::{
    CreateClassRequest, CreateProjectRequest, RegisterUserRequest, RequestContext,
    UploadDocumentRequest,
};

/// An in-memory hub plus the superuser most tests need.
pub struct TestBed {
    /// The assembled application under test.
    pub hub: ClassHub,
    /// A provisioned superuser.
    pub superuser: User,
    /// Context acting as the superuser.
    pub su_ctx: RequestContext,
}

impl TestBed {
    /// Creates an in-memory hub with a provisioned superuser.
    pub async fn new() -> Self {
        Self::seed(ClassHub::in_memory()).await
    }

    /// Same as [`TestBed::new`] but with a custom upload size limit.
    pub async fn with_upload_limit(max_upload_size_bytes: u64) -> Self {
        Self::seed(ClassHub::in_memory_with_upload_limit(max_upload_size_bytes)).await
    }

    async fn seed(hub: ClassHub) -> Self {
        let superuser = hub
            .users
            .register_superuser(register_req("prof"))
            .await
            .expect("provision superuser");
        let su_ctx = RequestContext::for_user(&superuser);
        Self {
            hub,
            superuser,
            su_ctx,
        }
    }

    /// Registers a common user and returns them with a context.
    pub async fn user(&self, username: &str) -> (User, RequestContext) {
        let user = self
            .hub
            .users
            .register(register_req(username))
            .await
            .expect("register user");
        let ctx = RequestContext::for_user(&user);
        (user, ctx)
    }

    /// Creates a class owned by the superuser.
    pub async fn class(&self, code: &str) -> Class {
        self.hub
            .classes
            .create_class(
                &self.su_ctx,
                CreateClassRequest {
                    code: code.to_string(),
                    name: format!("Class {code}"),
                    description: String::new(),
                },
            )
            .await
            .expect("create class")
    }

    /// Creates a project in the given class, owned by the given caller.
    pub async fn project(&self, ctx: &RequestContext, class_id: Uuid, name: &str) -> Project {
        self.hub
            .projects
            .create_project(
                ctx,
                CreateProjectRequest {
                    class_id,
                    name: name.to_string(),
                    description: String::new(),
                },
            )
            .await
            .expect("create project")
    }

    /// Uploads a small document into the given project.
    pub async fn document(&self, ctx: &RequestContext, project_id: Uuid, title: &str) -> Document {
        self.upload(ctx, project_id, title, &[])
            .await
            .expect("upload document")
    }

    /// Uploads a small document with tags, returning the raw result.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        title: &str,
        tags: &[&str],
    ) -> Result<Document, classhub::AppError> {
        self.hub
            .documents
            .upload(
                ctx,
                UploadDocumentRequest {
                    project_id,
                    title: title.to_string(),
                    file_name: format!("{title}.pdf"),
                    description: String::new(),
                    due_date: None,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                },
                sample_bytes(),
            )
            .await
    }
}

/// Builds a registration payload for the given username.
pub fn register_req(username: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        username: username.to_string(),
        email: Some(format!("{username}@example.edu")),
        display_name: None,
        computing_id: None,
    }
}

/// A small stand-in file body.
pub fn sample_bytes() -> Bytes {
    Bytes::from_static(b"%PDF-1.4 sample contents")
}
