//! Project lifecycle, membership, and the join-request workflow.

use classhub::ErrorKind;
use classhub::project::JoinOutcome;
use classhub::{CreateProjectRequest, RequestContext};
use uuid::Uuid;

use crate::helpers::TestBed;

#[tokio::test]
async fn test_project_creation_enrolls_the_owner() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (alice, alice_ctx) = bed.user("alice").await;

    let project = bed.project(&alice_ctx, class.id, "capstone").await;
    assert_eq!(project.owner_id, alice.id);
    assert!(project.folder_key.starts_with("documents/project-"));

    let members = bed
        .hub
        .membership
        .members(&alice_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, alice.id);

    let mine = bed.hub.projects.my_projects(&alice_ctx).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, project.id);

    let in_class = bed
        .hub
        .projects
        .list_for_class(&alice_ctx, class.id)
        .await
        .unwrap();
    assert_eq!(in_class.len(), 1);
}

#[tokio::test]
async fn test_pma_admins_cannot_own_projects() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (eve, eve_ctx) = bed.user("eve").await;

    bed.hub
        .classes
        .set_pma_admins(&bed.su_ctx, class.id, &[eve.id])
        .await
        .unwrap();

    // The context predates the appointment, so its role label still says
    // common; the class's admin set refuses the creation anyway.
    let err = bed
        .hub
        .projects
        .create_project(
            &eve_ctx,
            CreateProjectRequest {
                class_id: class.id,
                name: "smuggled".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_owner_cannot_be_removed() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (alice, alice_ctx) = bed.user("alice").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let err = bed
        .hub
        .membership
        .remove_member(&alice_ctx, project.id, alice.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOperation);
}

#[tokio::test]
async fn test_member_can_leave_but_outsiders_cannot_remove() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (alice, alice_ctx) = bed.user("alice").await;
    let (carol, carol_ctx) = bed.user("carol").await;
    let (_, dave_ctx) = bed.user("dave").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    bed.hub
        .membership
        .add_member(&alice_ctx, project.id, carol.id)
        .await
        .unwrap();

    let err = bed
        .hub
        .membership
        .remove_member(&dave_ctx, project.id, carol.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Leaving is a self-removal.
    bed.hub
        .membership
        .remove_member(&carol_ctx, project.id, carol.id)
        .await
        .unwrap();
    let members = bed
        .hub
        .membership
        .members(&alice_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, alice.id);
}

#[tokio::test]
async fn test_member_set_replacement_keeps_the_owner() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (alice, alice_ctx) = bed.user("alice").await;
    let (carol, _) = bed.user("carol").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    // The new list omits the owner; the stored set has them anyway.
    let stored = bed
        .hub
        .membership
        .set_members(&alice_ctx, project.id, &[carol.id])
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.contains(&alice.id));
    assert!(stored.contains(&carol.id));

    let stored = bed
        .hub
        .membership
        .set_members(&alice_ctx, project.id, &[])
        .await
        .unwrap();
    assert_eq!(stored, vec![alice.id]);

    let err = bed
        .hub
        .membership
        .set_members(&alice_ctx, project.id, &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_join_request_workflow() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (bob, bob_ctx) = bed.user("bob").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let outcome = bed
        .hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Requested);

    // Asking twice is not an error, just a no-op.
    let outcome = bed
        .hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::AlreadyPending);

    let pending = bed
        .hub
        .membership
        .pending_requests(&alice_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].user_id, bob.id);
    assert!(!pending[0].approved);

    bed.hub
        .membership
        .approve_join(&alice_ctx, project.id, bob.id)
        .await
        .unwrap();

    let members = bed
        .hub
        .membership
        .members(&alice_ctx, project.id)
        .await
        .unwrap();
    assert!(members.iter().any(|m| m.id == bob.id));
    let pending = bed
        .hub
        .membership
        .pending_requests(&alice_ctx, project.id)
        .await
        .unwrap();
    assert!(pending.is_empty());

    // A member has nothing left to request.
    let err = bed
        .hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_denied_request_is_consumed() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (bob, bob_ctx) = bed.user("bob").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    bed.hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap();
    bed.hub
        .membership
        .deny_join(&alice_ctx, project.id, bob.id)
        .await
        .unwrap();

    let err = bed
        .hub
        .membership
        .deny_join(&alice_ctx, project.id, bob.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Denial does not bar a fresh attempt.
    let outcome = bed
        .hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(outcome, JoinOutcome::Requested);
}

#[tokio::test]
async fn test_join_management_is_owner_only() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (bob, bob_ctx) = bed.user("bob").await;
    let (carol, carol_ctx) = bed.user("carol").await;
    let (eve, _) = bed.user("eve").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    bed.hub
        .membership
        .request_join(&bob_ctx, project.id)
        .await
        .unwrap();

    // A mere member cannot see or decide requests.
    bed.hub
        .membership
        .add_member(&alice_ctx, project.id, carol.id)
        .await
        .unwrap();
    let err = bed
        .hub
        .membership
        .pending_requests(&carol_ctx, project.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // Neither can a PMA admin of the class, even though they can delete
    // the whole project.
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
        .membership
        .approve_join(&eve_ctx, project.id, bob.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_project_deletion_rights() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (_, dave_ctx) = bed.user("dave").await;
    let (eve, _) = bed.user("eve").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let err = bed
        .hub
        .projects
        .delete_project(&dave_ctx, project.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // A PMA admin of the owning class may delete any of its projects.
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
    bed.hub
        .projects
        .delete_project(&eve_ctx, project.id)
        .await
        .unwrap();

    let err = bed
        .hub
        .projects
        .get_project(&alice_ctx, project.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Owners delete their own.
    let project = bed.project(&alice_ctx, class.id, "redo").await;
    bed.hub
        .projects
        .delete_project(&alice_ctx, project.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_project_comments() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (eve, _) = bed.user("eve").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    let err = bed
        .hub
        .projects
        .add_comment(&alice_ctx, project.id, "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    bed.hub
        .projects
        .add_comment(&alice_ctx, project.id, "kickoff notes")
        .await
        .unwrap();
    let comment = bed
        .hub
        .projects
        .add_comment(&alice_ctx, project.id, "  second thoughts  ")
        .await
        .unwrap();
    assert_eq!(comment.content, "second thoughts");

    let comments = bed
        .hub
        .projects
        .comments(&alice_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);

    // PMA admins are read-only participants.
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
        .projects
        .add_comment(&eve_ctx, project.id, "admin note")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
    let comments = bed
        .hub
        .projects
        .comments(&eve_ctx, project.id)
        .await
        .unwrap();
    assert_eq!(comments.len(), 2);
}

#[tokio::test]
async fn test_project_comment_deletion_rights() {
    let bed = TestBed::new().await;
    let class = bed.class("CS3240").await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (carol, carol_ctx) = bed.user("carol").await;
    let (_, dave_ctx) = bed.user("dave").await;
    let project = bed.project(&alice_ctx, class.id, "capstone").await;

    bed.hub
        .membership
        .add_member(&alice_ctx, project.id, carol.id)
        .await
        .unwrap();
    let comment = bed
        .hub
        .projects
        .add_comment(&carol_ctx, project.id, "from carol")
        .await
        .unwrap();

    let err = bed
        .hub
        .projects
        .delete_comment(&dave_ctx, comment.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    // The project owner may prune anyone's comment.
    bed.hub
        .projects
        .delete_comment(&alice_ctx, comment.id)
        .await
        .unwrap();
    let err = bed
        .hub
        .projects
        .delete_comment(&alice_ctx, comment.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Authors may retract their own.
    let comment = bed
        .hub
        .projects
        .add_comment(&carol_ctx, project.id, "again")
        .await
        .unwrap();
    bed.hub
        .projects
        .delete_comment(&carol_ctx, comment.id)
        .await
        .unwrap();
}
