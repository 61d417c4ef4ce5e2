//! `SeaORM` implementation of the `PostService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::AssetStore;
use crate::db::Store;
use crate::entities::{accounts, posts};
use crate::models::{Comment, Like, Post, PostDetail, Share, Tag, normalize_handle};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::identity_service::post_folder;
use crate::services::post_service::{NewPost, PostChanges, PostService};
use crate::services::relationship_service_impl::normalize_tags;
use crate::services::tokens::Subject;

pub struct SeaOrmPostService {
    store: Store,
    assets: Arc<dyn AssetStore>,
}

impl SeaOrmPostService {
    #[must_use]
    pub fn new(store: Store, assets: Arc<dyn AssetStore>) -> Self {
        Self { store, assets }
    }

    async fn actor(&self, identity: &Subject) -> ServiceResult<accounts::Model> {
        self.store
            .get_account_by_username(&normalize_handle(&identity.username))
            .await?
            .ok_or_else(|| ServiceError::not_found("Account"))
    }

    /// Loads the post and checks that `identity` owns it.
    async fn owned_post(
        &self,
        identity: &Subject,
        post_id: Uuid,
    ) -> ServiceResult<(accounts::Model, posts::Model)> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post"))?;
        let actor = self.actor(identity).await?;

        if post.account_id != actor.id {
            return Err(ServiceError::invalid("not the owner of this post"));
        }
        Ok((actor, post))
    }

    async fn discard_image(&self, url: &str) {
        if !self.assets.owns(url) {
            return;
        }
        if let Err(e) = self.assets.delete(url).await {
            warn!(url, error = %e, "Failed to remove post image");
        }
    }

    async fn detail(&self, post: posts::Model) -> ServiceResult<PostDetail> {
        let tags = self.store.tags_of_post(post.id).await?;
        let likes = self.store.likes_of_post(post.id).await?;
        let shares = self.store.shares_of_post(post.id).await?;
        let comments = self.store.comments_of_post(post.id).await?;

        Ok(PostDetail {
            post: post.into(),
            tags: tags.into_iter().map(Tag::from).collect(),
            likes: likes.into_iter().map(Like::from).collect(),
            shares: shares.into_iter().map(Share::from).collect(),
            comments: comments.into_iter().map(Comment::from).collect(),
        })
    }
}

#[async_trait]
impl PostService for SeaOrmPostService {
    async fn create_post(&self, identity: &Subject, new: NewPost) -> ServiceResult<PostDetail> {
        let actor = self.actor(identity).await?;
        let tags = normalize_tags(&new.tags)?;

        let image_url = self
            .assets
            .upload(new.image.bytes, &post_folder(&actor.username), &new.image.extension)
            .await?;

        let post = match self
            .store
            .create_post(actor.id, new.caption, image_url.clone(), &tags)
            .await
        {
            Ok(post) => post,
            Err(e) => {
                self.discard_image(&image_url).await;
                return Err(e.into());
            }
        };

        metrics::counter!("posts_created_total").increment(1);
        info!(post_id = %post.id, account_id = %actor.id, "Post created");

        self.detail(post).await
    }

    async fn get_post(&self, post_id: Uuid) -> ServiceResult<PostDetail> {
        let post = self
            .store
            .get_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post"))?;

        self.detail(post).await
    }

    async fn posts_of(&self, username: &str) -> ServiceResult<Vec<Post>> {
        let account = self
            .store
            .get_account_by_username(&normalize_handle(username))
            .await?
            .ok_or_else(|| ServiceError::not_found("Account"))?;

        let posts = self.store.posts_of_account(account.id).await?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    async fn update_post(
        &self,
        identity: &Subject,
        post_id: Uuid,
        changes: PostChanges,
    ) -> ServiceResult<PostDetail> {
        let (actor, post) = self.owned_post(identity, post_id).await?;
        let tags = changes.tags.as_deref().map(normalize_tags).transpose()?;

        let new_image = match changes.image {
            Some(image) => Some(
                self.assets
                    .upload(image.bytes, &post_folder(&actor.username), &image.extension)
                    .await?,
            ),
            None => None,
        };

        let updated = self
            .store
            .update_post(post_id, changes.caption, new_image.clone(), tags.as_deref())
            .await;

        let updated = match updated {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                if let Some(url) = &new_image {
                    self.discard_image(url).await;
                }
                return Err(ServiceError::not_found("Post"));
            }
            Err(e) => {
                if let Some(url) = &new_image {
                    self.discard_image(url).await;
                }
                return Err(e.into());
            }
        };

        if new_image.is_some() {
            self.discard_image(&post.image_url).await;
        }

        self.detail(updated).await
    }

    async fn delete_post(&self, identity: &Subject, post_id: Uuid) -> ServiceResult<()> {
        let (actor, _) = self.owned_post(identity, post_id).await?;

        let removed = self
            .store
            .delete_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post"))?;

        self.discard_image(&removed.image_url).await;

        info!(post_id = %post_id, account_id = %actor.id, "Post deleted");
        Ok(())
    }

    async fn add_comment(
        &self,
        identity: &Subject,
        post_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(ServiceError::not_found("Post"));
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::invalid("comment cannot be blank"));
        }

        let actor = self.actor(identity).await?;
        let comment = self
            .store
            .insert_comment(post_id, actor.id, body.to_string())
            .await?;

        metrics::counter!("comments_total").increment(1);
        Ok(comment.into())
    }

    async fn update_comment(
        &self,
        identity: &Subject,
        comment_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| ServiceError::invalid("comment not found"))?;
        let actor = self.actor(identity).await?;

        if comment.commenter_id != actor.id {
            return Err(ServiceError::invalid("not the author of this comment"));
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(ServiceError::invalid("comment cannot be blank"));
        }
        if body == comment.body.trim() {
            return Err(ServiceError::invalid("comment is unchanged"));
        }

        let updated = self.store.update_comment(comment, body.to_string()).await?;
        Ok(updated.into())
    }

    async fn delete_comment(&self, identity: &Subject, comment_id: Uuid) -> ServiceResult<()> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| ServiceError::invalid("comment not found"))?;
        let actor = self.actor(identity).await?;

        if comment.commenter_id != actor.id {
            return Err(ServiceError::invalid("not the author of this comment"));
        }

        self.store.delete_comment(comment.id).await?;
        Ok(())
    }
}
