mod common;

use common::{image, spawn, subject};
use olofooto::services::{
    AccountChanges, IdentityService, NewPost, PostChanges, PostService, RelationshipService,
    ServiceError, Subject,
};

#[tokio::test]
async fn test_create_post_normalizes_tags_and_stores_image() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;

    let detail = app.post_by(&alice, &["Travel", "#travel", "food"]).await;
    assert_eq!(detail.post.account_id, alice.id);
    assert_eq!(detail.tags.len(), 2);
    assert!(
        detail
            .post
            .image_url
            .starts_with("http://localhost:8000/media/users/alice/posts/")
    );

    let post_dir = app.media.path().join("users/alice/posts");
    assert_eq!(std::fs::read_dir(&post_dir).unwrap().count(), 1);

    let mine = app.state.posts.posts_of("Alice").await.unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn test_create_post_with_blank_tag_uploads_nothing() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;

    let err = app
        .state
        .posts
        .create_post(
            &subject(&alice),
            NewPost {
                caption: String::new(),
                image: image(),
                tags: vec!["ok".to_string(), " ".to_string()],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
    assert!(!app.media.path().join("users/alice/posts").exists());
}

#[tokio::test]
async fn test_only_the_owner_may_edit_or_delete() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let post = app.post_by(&alice, &[]).await.post.id;

    let err = app
        .state
        .posts
        .update_post(
            &subject(&bob),
            post,
            PostChanges {
                caption: Some("mine now".to_string()),
                ..PostChanges::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let err = app
        .state
        .posts
        .delete_post(&subject(&bob), post)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let updated = app
        .state
        .posts
        .update_post(
            &subject(&alice),
            post,
            PostChanges {
                caption: Some("golden hour".to_string()),
                tags: Some(vec!["sun".to_string()]),
                image: Some(image()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.post.caption, "golden hour");
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].name, "#sun");

    // The replaced image is removed from disk.
    let post_dir = app.media.path().join("users/alice/posts");
    assert_eq!(std::fs::read_dir(&post_dir).unwrap().count(), 1);
}

#[tokio::test]
async fn test_delete_post_removes_dependents() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let post = app.post_by(&alice, &["travel"]).await.post.id;

    app.state.relationships.toggle_like(bob.id, post).await.unwrap();
    app.state.relationships.share(bob.id, post).await.unwrap();
    app.state
        .posts
        .add_comment(&subject(&bob), post, "lovely")
        .await
        .unwrap();

    let detail = app.state.posts.get_post(post).await.unwrap();
    assert_eq!(detail.likes.len(), 1);
    assert_eq!(detail.shares.len(), 1);
    assert_eq!(detail.comments.len(), 1);

    app.state.posts.delete_post(&subject(&alice), post).await.unwrap();

    let err = app.state.posts.get_post(post).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(app.state.store.likes_of_post(post).await.unwrap().is_empty());
    assert!(app.state.store.shares_of_post(post).await.unwrap().is_empty());
    assert!(app.state.store.comments_of_post(post).await.unwrap().is_empty());
    assert!(app.state.store.tags_of_post(post).await.unwrap().is_empty());
    assert!(app.state.store.get_tag_by_name("#travel").await.unwrap().is_some());
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let bob = app.register("b@x.com", "bob").await;
    let post = app.post_by(&alice, &[]).await.post.id;

    let err = app
        .state
        .posts
        .add_comment(&subject(&bob), post, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let comment = app
        .state
        .posts
        .add_comment(&subject(&bob), post, "nice shot")
        .await
        .unwrap();
    assert_eq!(comment.commenter_id, bob.id);

    let err = app
        .state
        .posts
        .update_comment(&subject(&alice), comment.id, "edited")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let err = app
        .state
        .posts
        .update_comment(&subject(&bob), comment.id, "nice shot")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let edited = app
        .state
        .posts
        .update_comment(&subject(&bob), comment.id, "great shot")
        .await
        .unwrap();
    assert_eq!(edited.body, "great shot");

    app.state
        .posts
        .delete_comment(&subject(&bob), comment.id)
        .await
        .unwrap();
    assert!(app.state.store.get_comment(comment.id).await.unwrap().is_none());
}

fn file_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}

#[tokio::test]
async fn test_post_images_are_removed_after_username_change() {
    let app = spawn().await;
    let alice = app.register("a@x.com", "alice").await;
    let first = app.post_by(&alice, &[]).await.post.id;
    let second = app.post_by(&alice, &[]).await.post.id;

    let old_dir = app.media.path().join("users/alice/posts");
    assert_eq!(file_count(&old_dir), 2);

    let renamed = app
        .state
        .identity
        .update_fields(
            &subject(&alice),
            AccountChanges {
                username: Some("alice2".to_string()),
                ..AccountChanges::default()
            },
        )
        .await
        .unwrap();
    let me = Subject {
        uid: renamed.id,
        username: renamed.username.clone(),
    };

    app.state.posts.delete_post(&me, first).await.unwrap();
    assert_eq!(file_count(&old_dir), 1);

    app.state.identity.delete_account(&me).await.unwrap();
    assert!(app.state.store.get_post(second).await.unwrap().is_none());
    assert_eq!(file_count(&old_dir), 0);
}
