mod common;

use common::{spawn, spawn_with};
use olofooto::config::EngagementScope;
use olofooto::models::LikeOutcome;
use olofooto::services::{RelationshipService, ServiceError};

#[tokio::test]
async fn test_follow_twice_is_rejected() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    app.register("b@x.com", "bob").await;

    app.state.relationships.follow(alice.id, "bob").await.unwrap();
    let err = app
        .state
        .relationships
        .follow(alice.id, "BOB")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyFollowed));
}

#[tokio::test]
async fn test_follow_rejects_self_and_unknown_targets() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;

    let err = app
        .state
        .relationships
        .follow(alice.id, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let err = app
        .state
        .relationships
        .follow(alice.id, "nobody")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_unfollow_is_a_noop_when_absent() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;

    app.state.relationships.follow(alice.id, "bob").await.unwrap();
    assert!(app.state.store.follow_exists(alice.id, bob.id).await.unwrap());

    app.state.relationships.unfollow(alice.id, "bob").await.unwrap();
    assert!(!app.state.store.follow_exists(alice.id, bob.id).await.unwrap());

    app.state.relationships.unfollow(alice.id, "bob").await.unwrap();
}

#[tokio::test]
async fn test_account_scoped_like_occupies_a_single_slot() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let p1 = app.post_by(&alice, &[]).await.post.id;
    let p2 = app.post_by(&alice, &[]).await.post.id;

    let first = app.state.relationships.toggle_like(bob.id, p1).await.unwrap();
    assert_eq!(first, LikeOutcome::Liked);

    let second = app.state.relationships.toggle_like(bob.id, p2).await.unwrap();
    assert_eq!(second, LikeOutcome::Unliked);

    assert!(app.state.store.likes_by(bob.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_scoped_likes_are_independent() {
    let app = spawn_with(EngagementScope::Post).await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let p1 = app.post_by(&alice, &[]).await.post.id;
    let p2 = app.post_by(&alice, &[]).await.post.id;

    let likes = &app.state.relationships;
    assert_eq!(likes.toggle_like(bob.id, p1).await.unwrap(), LikeOutcome::Liked);
    assert_eq!(likes.toggle_like(bob.id, p2).await.unwrap(), LikeOutcome::Liked);
    assert_eq!(app.state.store.likes_by(bob.id, None).await.unwrap().len(), 2);

    assert_eq!(likes.toggle_like(bob.id, p1).await.unwrap(), LikeOutcome::Unliked);
    let remaining = app.state.store.likes_by(bob.id, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].post_id, p2);
}

#[tokio::test]
async fn test_like_missing_post_is_not_found() {
    let app = spawn().await;
    let bob = app.register("b@x.com", "bob").await;

    let err = app
        .state
        .relationships
        .toggle_like(bob.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_share_once_and_unshare() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let post = app.post_by(&alice, &[]).await.post.id;

    let share = app.state.relationships.share(bob.id, post).await.unwrap();
    assert_eq!(share.sharer_id, bob.id);

    let err = app.state.relationships.share(bob.id, post).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    assert_eq!(app.state.relationships.shares_of(bob.id).await.unwrap().len(), 1);

    // Only the sharer may undo a share.
    let err = app
        .state
        .relationships
        .unshare(alice.id, share.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    app.state.relationships.unshare(bob.id, share.id).await.unwrap();
    assert!(app.state.relationships.shares_of(bob.id).await.unwrap().is_empty());

    let err = app
        .state
        .relationships
        .unshare(bob.id, share.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_attach_tag_is_idempotent_across_spellings() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let post = app.post_by(&alice, &[]).await.post.id;

    let tags = &app.state.relationships;
    assert!(tags.attach_tag(post, "Travel").await.unwrap());
    assert!(!tags.attach_tag(post, "#travel").await.unwrap());

    let linked = app.state.store.tags_of_post(post).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].name, "#travel");

    let err = tags.attach_tag(post, "  # ").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_create_tag_rejects_duplicates() {
    let app = spawn().await;

    let tag = app.state.relationships.create_tag("Food").await.unwrap();
    assert_eq!(tag.name, "#food");

    let err = app
        .state
        .relationships
        .create_tag("#FOOD")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_replace_tags_and_lookup_by_tag() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let post = app.post_by(&alice, &["travel", "food"]).await.post.id;

    let names = vec!["Beach".to_string(), "#beach".to_string(), "sun".to_string()];
    app.state.relationships.replace_tags(post, &names).await.unwrap();

    let mut linked: Vec<String> = app
        .state
        .store
        .tags_of_post(post)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    linked.sort();
    assert_eq!(linked, vec!["#beach", "#sun"]);

    let beach = app.state.relationships.posts_by_tag("BEACH").await.unwrap();
    assert_eq!(beach.len(), 1);
    assert_eq!(beach[0].id, post);

    // Detached tags still exist but no longer point at the post.
    assert!(app.state.relationships.posts_by_tag("travel").await.unwrap().is_empty());
    assert!(app.state.relationships.posts_by_tag("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_tags_validates_before_clearing() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let post = app.post_by(&alice, &["travel"]).await.post.id;

    let names = vec!["ok".to_string(), "   ".to_string()];
    let err = app
        .state
        .relationships
        .replace_tags(post, &names)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let linked = app.state.store.tags_of_post(post).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].name, "#travel");
}
