//! Class administration, admin sets, and role labels.

use classhub::ErrorKind;
use classhub::user::UserRole;
use classhub::{CreateClassRequest, RequestContext};

use crate::helpers::TestBed;

#[tokio::test]
async fn test_class_creation_requires_superuser() {
    let bed = TestBed::new().await;
    let (_, alice_ctx) = bed.user("alice").await;

    let req = CreateClassRequest {
        code: "CS3240-F24".to_string(),
        name: "Software Engineering".to_string(),
        description: String::new(),
    };

    let err = bed
        .hub
        .classes
        .create_class(&alice_ctx, req.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let class = bed.hub.classes.create_class(&bed.su_ctx, req).await.unwrap();
    assert_eq!(class.code, "CS3240-F24");
    assert_eq!(class.owner_id, bed.superuser.id);

    let by_code = bed
        .hub
        .classes
        .get_by_code(&bed.su_ctx, "CS3240-F24")
        .await
        .unwrap();
    assert_eq!(by_code.id, class.id);
}

#[tokio::test]
async fn test_duplicate_class_code_is_a_conflict() {
    let bed = TestBed::new().await;
    bed.class("CS3240").await;

    let err = bed
        .hub
        .classes
        .create_class(
            &bed.su_ctx,
            CreateClassRequest {
                code: "CS3240".to_string(),
                name: "Again".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_admin_appointment_flips_role_label() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (bob, _) = bed.user("bob").await;

    let update = bed
        .hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[bob.id])
        .await
        .unwrap();
    assert_eq!(update.added, vec![bob.id]);
    assert!(update.removed.is_empty());

    let bob = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    assert_eq!(bob.role, UserRole::PmaAdmin);

    // Removal from the only admin set reverts the label.
    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[])
        .await
        .unwrap();
    let bob = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    assert_eq!(bob.role, UserRole::Common);
}

#[tokio::test]
async fn test_label_sticks_while_any_admin_set_lists_the_user() {
    let bed = TestBed::new().await;
    let class_a = bed.class("CS1").await;
    let class_b = bed.class("CS2").await;
    let (bob, _) = bed.user("bob").await;

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class_a.id, &[bob.id])
        .await
        .unwrap();
    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class_b.id, &[bob.id])
        .await
        .unwrap();

    // Dropped from one class, still an admin of the other.
    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class_a.id, &[])
        .await
        .unwrap();
    let fetched = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    assert_eq!(fetched.role, UserRole::PmaAdmin);

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class_b.id, &[])
        .await
        .unwrap();
    let fetched = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    assert_eq!(fetched.role, UserRole::Common);
}

#[tokio::test]
async fn test_admin_set_replacement_reports_the_diff() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (bob, _) = bed.user("bob").await;
    let (carol, _) = bed.user("carol").await;
    let (dave, _) = bed.user("dave").await;

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[bob.id, carol.id])
        .await
        .unwrap();

    let update = bed
        .hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[carol.id, dave.id])
        .await
        .unwrap();
    assert_eq!(update.added, vec![dave.id]);
    assert_eq!(update.removed, vec![bob.id]);

    // Unchanged set is a no-op with nothing rewritten.
    let update = bed
        .hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[dave.id, carol.id])
        .await
        .unwrap();
    assert!(update.is_noop());
    assert!(update.role_changes.is_empty());
}

#[tokio::test]
async fn test_admin_set_with_unknown_user_is_not_found() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;

    let err = bed
        .hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_class_roster_replacement() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (alice, _) = bed.user("alice").await;
    let (bob, _) = bed.user("bob").await;

    bed.hub
        .classes
        .set_members(&bed.su_ctx, class.id, &[alice.id, bob.id])
        .await
        .unwrap();

    let roster = bed
        .hub
        .classes
        .class_members(&bed.su_ctx, class.id)
        .await
        .unwrap();
    let mut names: Vec<&str> = roster.iter().map(|u| u.username.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alice", "bob"]);

    bed.hub
        .classes
        .set_members(&bed.su_ctx, class.id, &[bob.id])
        .await
        .unwrap();
    let roster = bed
        .hub
        .classes
        .class_members(&bed.su_ctx, class.id)
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, bob.id);
}

#[tokio::test]
async fn test_class_administration_is_superuser_only() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (bob, bob_ctx) = bed.user("bob").await;

    // Even a PMA admin of this very class cannot administer it.
    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[bob.id])
        .await
        .unwrap();
    let bob = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    let bob_admin_ctx = RequestContext::for_user(&bob);

    for ctx in [&bob_ctx, &bob_admin_ctx] {
        let err = bed
            .hub
            .classes
            .set_members(ctx, class.id, &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionDenied);

        let err = bed
            .hub
            .classes
            .set_pma_admins(ctx, class.id, &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionDenied);

        let err = bed.hub.classes.delete_class(ctx, class.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PermissionDenied);
    }
}

#[tokio::test]
async fn test_class_deletion_cascades_and_demotes() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (bob, _) = bed.user("bob").await;
    let (_, alice_ctx) = bed.user("alice").await;

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[bob.id])
        .await
        .unwrap();
    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    let document = bed.document(&alice_ctx, project.id, "notes").await;

    let deletion = bed
        .hub
        .classes
        .delete_class(&bed.su_ctx, class.id)
        .await
        .unwrap();
    assert_eq!(deletion.blob_keys, vec![document.storage_key.clone()]);
    assert!(
        deletion
            .role_changes
            .iter()
            .any(|c| c.user_id == bob.id && c.role == UserRole::Common)
    );

    // The cascade took the project and the document with it.
    let err = bed
        .hub
        .projects
        .get_project(&alice_ctx, project.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = bed
        .hub
        .documents
        .get_document(&alice_ctx, document.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Former admin is a common user again.
    let bob = bed
        .hub
        .users
        .get_profile(&bed.su_ctx, bob.id)
        .await
        .unwrap();
    assert_eq!(bob.role, UserRole::Common);
}

#[tokio::test]
async fn test_class_listing_is_newest_first() {
    let bed = TestBed::new().await;
    let first = bed.class("CS1").await;
    let second = bed.class("CS2").await;

    let classes = bed.hub.classes.list_classes(&bed.su_ctx).await.unwrap();
    let position = |id| classes.iter().position(|c| c.id == id).unwrap();
    assert!(position(second.id) < position(first.id));
}
