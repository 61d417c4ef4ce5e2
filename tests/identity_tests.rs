mod common;

use common::{FailingMailer, PASSWORD, image, new_account, spawn, spawn_custom, subject};
use olofooto::clients::LogMailer;
use std::sync::Arc;
use olofooto::models::Gender;
use olofooto::services::{
    AccountChanges, Claims, Field, IdentityService, RelationshipService, ServiceError,
};

#[tokio::test]
async fn test_register_verify_login_flow() {
    let app = spawn().await;

    let account = app.register("A@X.com", "Alice").await;
    assert_eq!(account.email, "a@x.com");
    assert_eq!(account.username, "alice");
    assert!(!account.is_verified);
    assert_eq!(account.profile_url, app.config.assets.default_profile_url);

    let code = app.otp_for("a@x.com").await.expect("otp stored");
    assert_eq!(code.len(), 6);

    app.state.identity.verify_otp("a@x.com", &code).await.unwrap();

    let err = app
        .state
        .identity
        .verify_otp("a@x.com", &code)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOtp));

    let pair = app.login("a@x.com").await;
    assert_eq!(pair.token_type, "bearer");

    let access = app.state.tokens.verify(&pair.access_token).unwrap();
    assert!(!access.refresh);
    assert_eq!(access.user_data.username, "alice");

    let refresh = app.state.tokens.verify(&pair.refresh_token).unwrap();
    assert!(refresh.refresh);

    let profile = app
        .state
        .identity
        .current_account(&access.user_data)
        .await
        .unwrap();
    assert!(profile.account.is_verified);
}

#[tokio::test]
async fn test_wrong_otp_is_rejected_and_code_stays_valid() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;
    let code = app.otp_for("a@x.com").await.unwrap();

    let wrong = if code == "000000" { "000001" } else { "000000" };
    let err = app.state.identity.verify_otp("a@x.com", wrong).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOtp));

    assert!(app.state.identity.verify_otp("a@x.com", &code).await.is_ok());
}

#[tokio::test]
async fn test_duplicate_email_is_checked_before_username() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;

    let err = app
        .state
        .identity
        .register(new_account("a@x.com", "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(Field::Email)));

    let err = app
        .state
        .identity
        .register(new_account("b@x.com", "ALICE"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(Field::Username)));

    assert_eq!(app.state.identity.search_accounts("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;

    let unknown = app
        .state
        .identity
        .login("nobody@x.com", PASSWORD)
        .await
        .unwrap_err();
    let wrong = app
        .state
        .identity
        .login("a@x.com", "wrong password")
        .await
        .unwrap_err();

    assert!(matches!(unknown, ServiceError::InvalidCredentials));
    assert!(matches!(wrong, ServiceError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_refresh_requires_refresh_token() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;
    let pair = app.login("a@x.com").await;

    let access = app.state.tokens.verify(&pair.access_token).unwrap();
    let err = app.state.identity.refresh_session(&access).await.unwrap_err();
    assert!(matches!(err, ServiceError::RefreshTokenRequired));

    let refresh = app.state.tokens.verify(&pair.refresh_token).unwrap();
    let renewed = app.state.identity.refresh_session(&refresh).await.unwrap();
    assert!(app.state.tokens.verify_access(&renewed.access_token).is_ok());

    let ghost = Claims {
        user_data: olofooto::services::Subject {
            uid: uuid::Uuid::new_v4(),
            username: "ghost".to_string(),
        },
        ..refresh
    };
    let err = app.state.identity.refresh_session(&ghost).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;

    app.state
        .identity
        .request_password_reset("A@x.com")
        .await
        .unwrap();
    assert!(app.otp_for("a@x.com").await.is_some());

    app.state
        .identity
        .reset_password("a@x.com", "brand new password")
        .await
        .unwrap();

    assert!(app.state.identity.login("a@x.com", PASSWORD).await.is_err());
    assert!(
        app.state
            .identity
            .login("a@x.com", "brand new password")
            .await
            .is_ok()
    );

    let err = app
        .state
        .identity
        .request_password_reset("missing@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_change_password() {
    let app = spawn().await;
    let account = app.register("a@x.com", "alice").await;
    let me = subject(&account);

    let err = app
        .state
        .identity
        .change_password(&me, "not my password", "whatever123")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    // Same password again succeeds without touching the row.
    app.state
        .identity
        .change_password(&me, PASSWORD, PASSWORD)
        .await
        .unwrap();

    app.state
        .identity
        .change_password(&me, PASSWORD, "another password")
        .await
        .unwrap();
    assert!(app.state.identity.login("a@x.com", "another password").await.is_ok());
}

#[tokio::test]
async fn test_update_fields() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    app.register("b@x.com", "bob").await;

    let updated = app
        .state
        .identity
        .update_fields(
            &subject(&alice),
            AccountChanges {
                full_name: Some("  Alice Liddell ".to_string()),
                gender: Some(Gender::Female),
                about: Some("down the rabbit hole".to_string()),
                ..AccountChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Alice Liddell");
    assert_eq!(updated.gender, Gender::Female);
    assert_eq!(updated.about, "down the rabbit hole");

    let err = app
        .state
        .identity
        .update_fields(
            &subject(&alice),
            AccountChanges {
                username: Some("Bob".to_string()),
                ..AccountChanges::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(Field::Username)));

    let renamed = app
        .state
        .identity
        .update_fields(
            &subject(&alice),
            AccountChanges {
                username: Some("alicia".to_string()),
                ..AccountChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.username, "alicia");

    // Tokens carry the old username, which no longer resolves.
    let err = app
        .state
        .identity
        .current_account(&subject(&alice))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));
}

#[tokio::test]
async fn test_profile_image_replacement_removes_previous_upload() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let me = subject(&alice);

    let first = app
        .state
        .identity
        .update_profile_image(&me, image())
        .await
        .unwrap();
    assert!(first.profile_url.starts_with(&app.config.assets.public_base_url));

    let profile_dir = app.media.path().join("users/profile");
    assert_eq!(std::fs::read_dir(&profile_dir).unwrap().count(), 1);

    let second = app
        .state
        .identity
        .update_profile_image(&me, image())
        .await
        .unwrap();
    assert_ne!(first.profile_url, second.profile_url);
    assert_eq!(std::fs::read_dir(&profile_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_search_accounts_by_name_prefix() {
    let app = spawn().await;
    app.register("a@x.com", "alice").await;
    app.register("b@x.com", "bob").await;

    let found = app.state.identity.search_accounts("ALI").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "alice");

    assert!(app.state.identity.search_accounts("  ").await.unwrap().is_empty());
    assert!(app.state.identity.search_accounts("zed").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_account_removes_posts_and_edges() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;

    app.state.relationships.follow(bob.id, "alice").await.unwrap();
    app.state.relationships.follow(alice.id, "bob").await.unwrap();
    let post = app.post_by(&alice, &["travel"]).await;
    app.state
        .relationships
        .toggle_like(bob.id, post.post.id)
        .await
        .unwrap();

    app.state.identity.delete_account(&subject(&alice)).await.unwrap();

    assert!(app.state.store.get_account(alice.id).await.unwrap().is_none());
    assert!(app.state.store.get_post(post.post.id).await.unwrap().is_none());
    assert!(app.state.store.likes_by(bob.id, None).await.unwrap().is_empty());

    let profile = app.state.identity.current_account(&subject(&bob)).await.unwrap();
    assert!(profile.followers.is_empty());
    assert!(profile.following.is_empty());

    let post_dir = app.media.path().join("users/alice/posts");
    assert_eq!(std::fs::read_dir(&post_dir).unwrap().count(), 0);

    let err = app
        .state
        .identity
        .delete_account(&subject(&alice))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidToken));
}

#[tokio::test]
async fn test_verified_email_gate_blocks_login_until_otp() {
    let app = spawn_custom(
        |config| config.security.require_verified_email = true,
        Arc::new(LogMailer),
    )
    .await;
    app.register("a@x.com", "alice").await;

    let err = app.state.identity.login("a@x.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    // A wrong password reports bad credentials, not the verification state.
    let err = app
        .state
        .identity
        .login("a@x.com", "wrong password")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    let code = app.otp_for("a@x.com").await.unwrap();
    app.state.identity.verify_otp("a@x.com", &code).await.unwrap();

    assert!(app.state.identity.login("a@x.com", PASSWORD).await.is_ok());
}

#[tokio::test]
async fn test_mail_failure_does_not_fail_registration_or_reset() {
    let app = spawn_custom(|_| {}, Arc::new(FailingMailer)).await;

    let account = app
        .state
        .identity
        .register(new_account("a@x.com", "alice"))
        .await
        .unwrap();
    assert_eq!(account.username, "alice");
    assert!(app.otp_for("a@x.com").await.is_some());

    app.state
        .identity
        .request_password_reset("a@x.com")
        .await
        .unwrap();
    let code = app.otp_for("a@x.com").await.expect("otp stored");
    assert_eq!(code.len(), 6);

    // Let the spawned deliveries run and fail.
    tokio::task::yield_now().await;
    assert!(app.state.store.get_account(account.id).await.unwrap().is_some());
}
