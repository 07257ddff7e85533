//! Document upload, engagement counters, comments, and search.

use bytes::Bytes;
use chrono::NaiveDate;

use classhub::document::LikeOutcome;
use classhub::{ErrorKind, RequestContext, SessionViews, UploadDocumentRequest};

use crate::helpers::{TestBed, sample_bytes};

#[tokio::test]
async fn test_upload_requires_project_membership() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (bob, bob_ctx) = bed.user("bob").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let err = bed
        .hub
        .documents
        .upload(
            &bob_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "outsider".to_string(),
                file_name: "outsider.pdf".to_string(),
                description: String::new(),
                due_date: None,
                tags: Vec::new(),
            },
            sample_bytes(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    bed.hub
        .membership
        .add_member(&alice_ctx, project.id, bob.id)
        .await
        .unwrap();
    let document = bed
        .hub
        .documents
        .upload(
            &bob_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "Sprint Plan".to_string(),
                file_name: "sprint.pdf".to_string(),
                description: "week one".to_string(),
                due_date: NaiveDate::from_ymd_opt(2026, 12, 1),
                tags: Vec::new(),
            },
            sample_bytes(),
        )
        .await
        .unwrap();

    assert_eq!(document.owner_id, bob.id);
    assert_eq!(document.storage_key, format!("{}/sprint.pdf", project.folder_key));
    assert_eq!(document.file_name(), "sprint.pdf");
    assert_eq!(document.due_date, NaiveDate::from_ymd_opt(2026, 12, 1));
    assert_eq!(document.views, 0);
    assert_eq!(document.likes, 0);

    let listed = bed
        .hub
        .documents
        .list_for_project(&alice_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let body = bed
        .hub
        .documents
        .download(&alice_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(body, sample_bytes());
}

#[tokio::test]
async fn test_upload_validation() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let err = bed
        .hub
        .documents
        .upload(
            &alice_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "   ".to_string(),
                file_name: "notes.pdf".to_string(),
                description: String::new(),
                due_date: None,
                tags: Vec::new(),
            },
            sample_bytes(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    for bad in ["", "  ", "a/b.pdf", "a\\b.pdf", ".", ".."] {
        let err = bed
            .hub
            .documents
            .upload(
                &alice_ctx,
                UploadDocumentRequest {
                    project_id: project.id,
                    title: "Notes".to_string(),
                    file_name: bad.to_string(),
                    description: String::new(),
                    due_date: None,
                    tags: Vec::new(),
                },
                sample_bytes(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "file name {bad:?}");
    }
}

#[tokio::test]
async fn test_upload_size_limit() {
    let bed = TestBed::with_upload_limit(16).await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    // The stock sample body is larger than 16 bytes.
    let err = bed
        .hub
        .documents
        .upload(
            &alice_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "Big".to_string(),
                file_name: "big.pdf".to_string(),
                description: String::new(),
                due_date: None,
                tags: Vec::new(),
            },
            sample_bytes(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    bed.hub
        .documents
        .upload(
            &alice_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "Small".to_string(),
                file_name: "small.pdf".to_string(),
                description: String::new(),
                due_date: None,
                tags: Vec::new(),
            },
            Bytes::from_static(b"tiny"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_duplicate_file_name_keeps_the_original_blob() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let original = bed.document(&alice_ctx, project.id, "notes").await;

    // Same file name, different contents: refused, and the first
    // document's file must survive untouched.
    let err = bed
        .hub
        .documents
        .upload(
            &alice_ctx,
            UploadDocumentRequest {
                project_id: project.id,
                title: "Rewrite".to_string(),
                file_name: "notes.pdf".to_string(),
                description: String::new(),
                due_date: None,
                tags: Vec::new(),
            },
            Bytes::from_static(b"overwritten"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let body = bed
        .hub
        .documents
        .download(&alice_ctx, original.id)
        .await
        .unwrap();
    assert_eq!(body, sample_bytes());
}

#[tokio::test]
async fn test_tags_are_normalized_and_shared() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let first = bed
        .upload(&alice_ctx, project.id, "first", &["Rust", " rust ", "ML", ""])
        .await
        .unwrap();
    let tags = bed.hub.documents.tags(&alice_ctx, first.id).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["ml", "rust"]);

    // A second document reuses the global tag row.
    let second = bed
        .upload(&alice_ctx, project.id, "second", &["rust"])
        .await
        .unwrap();
    let second_tags = bed.hub.documents.tags(&alice_ctx, second.id).await.unwrap();
    assert_eq!(second_tags.len(), 1);
    let rust_id = tags.iter().find(|t| t.name == "rust").map(|t| t.id);
    assert_eq!(Some(second_tags[0].id), rust_id);
}

#[tokio::test]
async fn test_views_count_once_per_session() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;

    let mut session = SessionViews::new();
    let viewed = bed
        .hub
        .engagement
        .record_view(&alice_ctx, document.id, &mut session)
        .await
        .unwrap();
    assert_eq!(viewed.views, 1);

    // Repeat views in the same session leave the counter alone.
    let viewed = bed
        .hub
        .engagement
        .record_view(&alice_ctx, document.id, &mut session)
        .await
        .unwrap();
    assert_eq!(viewed.views, 1);

    let mut fresh = SessionViews::new();
    let viewed = bed
        .hub
        .engagement
        .record_view(&alice_ctx, document.id, &mut fresh)
        .await
        .unwrap();
    assert_eq!(viewed.views, 2);
}

#[tokio::test]
async fn test_like_toggle() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (_, bob_ctx) = bed.user("bob").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;

    let toggle = bed
        .hub
        .engagement
        .toggle_like(&alice_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(toggle.outcome, LikeOutcome::Liked);
    assert_eq!(toggle.likes, 1);
    assert!(
        bed.hub
            .engagement
            .is_liked(&alice_ctx, document.id)
            .await
            .unwrap()
    );

    let toggle = bed
        .hub
        .engagement
        .toggle_like(&bob_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(toggle.likes, 2);

    let toggle = bed
        .hub
        .engagement
        .toggle_like(&alice_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(toggle.outcome, LikeOutcome::Unliked);
    assert_eq!(toggle.likes, 1);
    assert!(
        !bed.hub
            .engagement
            .is_liked(&alice_ctx, document.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_document_comment_deletion_rights() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (carol, carol_ctx) = bed.user("carol").await;
    let (dave, dave_ctx) = bed.user("dave").await;
    let (_, outsider_ctx) = bed.user("trudy").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    bed.hub
        .membership
        .set_members(&alice_ctx, project.id, &[carol.id, dave.id])
        .await
        .unwrap();

    // Carol owns the document; Dave authors the comments.
    let document = bed.document(&carol_ctx, project.id, "notes").await;
    let c1 = bed
        .hub
        .engagement
        .add_comment(&dave_ctx, document.id, "comment 1")
        .await
        .unwrap();
    let c2 = bed
        .hub
        .engagement
        .add_comment(&dave_ctx, document.id, "comment 2")
        .await
        .unwrap();
    let c3 = bed
        .hub
        .engagement
        .add_comment(&dave_ctx, document.id, "comment 3")
        .await
        .unwrap();

    let err = bed
        .hub
        .engagement
        .delete_comment(&outsider_ctx, c1.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Author, document owner, and project owner may each delete.
    bed.hub
        .engagement
        .delete_comment(&dave_ctx, c1.id)
        .await
        .unwrap();
    bed.hub
        .engagement
        .delete_comment(&carol_ctx, c2.id)
        .await
        .unwrap();
    bed.hub
        .engagement
        .delete_comment(&alice_ctx, c3.id)
        .await
        .unwrap();

    let comments = bed
        .hub
        .engagement
        .comments(&dave_ctx, document.id)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_document_comment_authorship_is_role_gated() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (eve, _) = bed.user("eve").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[eve.id])
        .await
        .unwrap();
    let eve = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, eve.id)
        .await
        .unwrap();
    let eve_ctx = RequestContext::for_user(&eve);

    let err = bed
        .hub
        .engagement
        .add_comment(&eve_ctx, document.id, "grading note")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let err = bed
        .hub
        .engagement
        .add_comment(&RequestContext::anonymous(), document.id, "drive-by")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Reading the thread stays open to the admin.
    let comments = bed
        .hub
        .engagement
        .comments(&eve_ctx, document.id)
        .await
        .unwrap();
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_guests_are_refused_engagement() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;
    let guest = RequestContext::anonymous();

    let err = bed
        .hub
        .engagement
        .toggle_like(&guest, document.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let mut views = SessionViews::new();
    let err = bed
        .hub
        .engagement
        .record_view(&guest, document.id, &mut views)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let unchanged = bed
        .hub
        .documents
        .get_document(&alice_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(unchanged.views, 0);
    assert_eq!(unchanged.likes, 0);
}

#[tokio::test]
async fn test_document_deletion_rights_and_report() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (carol, carol_ctx) = bed.user("carol").await;
    let (eve, _) = bed.user("eve").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;

    // A fellow member owns no deletion rights over it.
    bed.hub
        .membership
        .add_member(&alice_ctx, project.id, carol.id)
        .await
        .unwrap();
    let err = bed
        .hub
        .documents
        .delete_document(&carol_ctx, document.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let deletion = bed
        .hub
        .documents
        .delete_document(&alice_ctx, document.id)
        .await
        .unwrap();
    assert_eq!(deletion.document_id, document.id);
    assert!(deletion.blob_deleted);

    let err = bed
        .hub
        .documents
        .get_document(&alice_ctx, document.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = bed
        .hub
        .documents
        .download(&alice_ctx, document.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // A PMA admin of the class may delete any member's document.
    let document = bed.document(&alice_ctx, project.id, "second").await;
    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[eve.id])
        .await
        .unwrap();
    let eve = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, eve.id)
        .await
        .unwrap();
    let eve_ctx = RequestContext::for_user(&eve);
    let deletion = bed
        .hub
        .documents
        .delete_document(&eve_ctx, document.id)
        .await
        .unwrap();
    assert!(deletion.blob_deleted);
}

#[tokio::test]
async fn test_search_is_scoped_to_the_callers_projects() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (_, bob_ctx) = bed.user("bob").await;

    let alice_project = bed.project(&alice_ctx, class.id, "alpha").await;
    let bob_project = bed.project(&bob_ctx, class.id, "beta").await;
    let alice_doc = bed.document(&alice_ctx, alice_project.id, "Rust Notes").await;
    bed.document(&bob_ctx, bob_project.id, "Rust Guide").await;

    let hits = bed.hub.search.search(&alice_ctx, "rust").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, alice_doc.id);

    // Case does not matter, blank queries match nothing.
    let hits = bed.hub.search.search(&alice_ctx, "RUST").await.unwrap();
    assert_eq!(hits.len(), 1);
    let hits = bed.hub.search.search(&alice_ctx, "   ").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_search_matches_tags_and_literal_wildcards() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "alpha").await;

    let tagged = bed
        .upload(&alice_ctx, project.id, "week one", &["machine-learning"])
        .await
        .unwrap();
    let percent = bed.document(&alice_ctx, project.id, "100% done").await;
    bed.document(&alice_ctx, project.id, "plain").await;

    let hits = bed.hub.search.search(&alice_ctx, "machine").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, tagged.id);

    // A percent sign in the query is a literal, not a match-everything
    // wildcard.
    let hits = bed.hub.search.search(&alice_ctx, "%").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, percent.id);
}
