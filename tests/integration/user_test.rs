//! Account registration, profiles, and avatars.

use bytes::Bytes;

use classhub::user::{AcademicYear, UserRole};
use classhub::{ErrorKind, RequestContext, UpdateProfileRequest};

use crate::helpers::{TestBed, register_req};

#[tokio::test]
async fn test_register_and_fetch_profile() {
    let bed = TestBed::new().await;
    let (alice, _) = bed.user("alice").await;

    assert_eq!(alice.username, "alice");
    assert_eq!(alice.email.as_deref(), Some("alice@example.edu"));
    assert!(!alice.is_superuser);
    assert_eq!(alice.role, UserRole::Common);

    // Any authenticated user can look a profile up.
    let (_, bob_ctx) = bed.user("bob").await;
    let fetched = bed.hub.users.get_profile(&bob_ctx, alice.id).await.unwrap();
    assert_eq!(fetched.id, alice.id);

    let by_name = bed
        .hub
        .users
        .get_by_username(&bob_ctx, "alice")
        .await
        .unwrap();
    assert_eq!(by_name.id, alice.id);
}

#[tokio::test]
async fn test_superuser_standing_comes_only_from_provisioning() {
    let bed = TestBed::new().await;
    assert!(bed.superuser.is_superuser);
    // Provisioning grants standing, not a special role label.
    assert_eq!(bed.superuser.role, UserRole::Common);

    let (alice, _) = bed.user("alice").await;
    assert!(!alice.is_superuser);
}

#[tokio::test]
async fn test_duplicate_username_is_a_conflict() {
    let bed = TestBed::new().await;
    bed.user("alice").await;

    let err = bed
        .hub
        .users
        .register(register_req("alice"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_username_validation() {
    let bed = TestBed::new().await;

    for bad in ["", "   ", "two words", &"x".repeat(151)] {
        let mut req = register_req("ok");
        req.username = bad.to_string();
        let err = bed.hub.users.register(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "username {bad:?}");
    }

    // Surrounding whitespace is trimmed rather than refused.
    let mut req = register_req("carol");
    req.username = "  carol  ".to_string();
    let user = bed.hub.users.register(req).await.unwrap();
    assert_eq!(user.username, "carol");
}

#[tokio::test]
async fn test_anonymous_cannot_read_profiles() {
    let bed = TestBed::new().await;
    let (alice, _) = bed.user("alice").await;

    let guest = RequestContext::anonymous();
    let err = bed
        .hub
        .users
        .get_profile(&guest, alice.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_profile_updates_are_owner_only() {
    let bed = TestBed::new().await;
    let (alice, alice_ctx) = bed.user("alice").await;
    let (_, bob_ctx) = bed.user("bob").await;

    let update = UpdateProfileRequest {
        user_id: alice.id,
        email: Some("alice@cs.example.edu".to_string()),
        display_name: Some("Alice".to_string()),
        computing_id: Some("abc1de".to_string()),
        major: Some("Computer Science".to_string()),
        year: Some(AcademicYear::ThirdYear),
        bio: Some("Systems person".to_string()),
    };

    let err = bed
        .hub
        .users
        .update_profile(&bob_ctx, update.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);

    let updated = bed
        .hub
        .users
        .update_profile(&alice_ctx, update)
        .await
        .unwrap();
    assert_eq!(updated.display_name.as_deref(), Some("Alice"));
    assert_eq!(updated.major.as_deref(), Some("Computer Science"));
    assert_eq!(updated.year, Some(AcademicYear::ThirdYear));

    // Fields are replaced wholesale: None clears.
    let cleared = bed
        .hub
        .users
        .update_profile(
            &alice_ctx,
            UpdateProfileRequest {
                user_id: alice.id,
                email: None,
                display_name: None,
                computing_id: None,
                major: None,
                year: None,
                bio: None,
            },
        )
        .await
        .unwrap();
    assert!(cleared.major.is_none());
    assert!(cleared.year.is_none());
    assert!(cleared.bio.is_none());
}

#[tokio::test]
async fn test_duplicate_computing_id_is_a_conflict() {
    let bed = TestBed::new().await;
    let (_, alice_ctx) = bed.user("alice").await;
    let (bob, bob_ctx) = bed.user("bob").await;

    let alice = bed
        .hub
        .users
        .get_by_username(&alice_ctx, "alice")
        .await
        .unwrap();
    bed.hub
        .users
        .update_profile(
            &alice_ctx,
            UpdateProfileRequest {
                user_id: alice.id,
                email: alice.email.clone(),
                display_name: None,
                computing_id: Some("abc1de".to_string()),
                major: None,
                year: None,
                bio: None,
            },
        )
        .await
        .unwrap();

    let err = bed
        .hub
        .users
        .update_profile(
            &bob_ctx,
            UpdateProfileRequest {
                user_id: bob.id,
                email: bob.email.clone(),
                display_name: None,
                computing_id: Some("abc1de".to_string()),
                major: None,
                year: None,
                bio: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_profile_field_limits() {
    let bed = TestBed::new().await;
    let (alice, alice_ctx) = bed.user("alice").await;

    let mut req = register_req("carol");
    req.computing_id = Some("elevenchars".to_string());
    let err = bed.hub.users.register(req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = bed
        .hub
        .users
        .update_profile(
            &alice_ctx,
            UpdateProfileRequest {
                user_id: alice.id,
                email: None,
                display_name: None,
                computing_id: None,
                major: None,
                year: None,
                bio: Some("x".repeat(501)),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_blank_computing_ids_do_not_collide() {
    let bed = TestBed::new().await;

    // Blank computing ids are stored as absent, so two of them never
    // trip the uniqueness rule.
    let mut req = register_req("alice");
    req.computing_id = Some("   ".to_string());
    let alice = bed.hub.users.register(req).await.unwrap();
    assert!(alice.computing_id.is_none());

    let mut req = register_req("bob");
    req.computing_id = Some(String::new());
    bed.hub.users.register(req).await.unwrap();
}

#[tokio::test]
async fn test_avatar_upload_and_replacement() {
    let bed = TestBed::new().await;
    let (alice, alice_ctx) = bed.user("alice").await;

    let first = bed
        .hub
        .users
        .set_avatar(&alice_ctx, alice.id, "face.png", Bytes::from_static(b"v1"))
        .await
        .unwrap();
    assert_eq!(first.avatar_key.as_deref(), Some("profiles/alice/face.png"));

    let bytes = bed
        .hub
        .users
        .avatar_bytes(&alice_ctx, alice.id)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"v1");

    // Replacing swaps the stored key and serves the new contents.
    let second = bed
        .hub
        .users
        .set_avatar(&alice_ctx, alice.id, "new.png", Bytes::from_static(b"v2"))
        .await
        .unwrap();
    assert_eq!(second.avatar_key.as_deref(), Some("profiles/alice/new.png"));

    let bytes = bed
        .hub
        .users
        .avatar_bytes(&alice_ctx, alice.id)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"v2");

    // Only the owner may change it.
    let (_, bob_ctx) = bed.user("bob").await;
    let err = bed
        .hub
        .users
        .set_avatar(&bob_ctx, alice.id, "x.png", Bytes::from_static(b"x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_avatar_file_name_validation() {
    let bed = TestBed::new().await;
    let (alice, alice_ctx) = bed.user("alice").await;

    for bad in ["", "  ", "a/b.png", "..", "c\\d.png"] {
        let err = bed
            .hub
            .users
            .set_avatar(&alice_ctx, alice.id, bad, Bytes::from_static(b"x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "file name {bad:?}");
    }
}
