//! `SeaORM` implementation of the `RelationshipService` trait.

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngagementScope;
use crate::db::{Outcome, Store};
use crate::models::{LikeOutcome, Post, Share, Tag, normalize_handle, normalize_tag};
use crate::services::error::{Field, ServiceError, ServiceResult};
use crate::services::relationship_service::RelationshipService;

fn required_tag(raw: &str) -> ServiceResult<String> {
    normalize_tag(raw).ok_or_else(|| ServiceError::invalid("tag name cannot be blank"))
}

/// Normalizes every name up front so a blank entry fails before anything is written.
pub(crate) fn normalize_tags(raw_names: &[String]) -> ServiceResult<Vec<String>> {
    let mut names = Vec::with_capacity(raw_names.len());
    for raw in raw_names {
        let name = required_tag(raw)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

pub struct SeaOrmRelationshipService {
    store: Store,
    scope: EngagementScope,
}

impl SeaOrmRelationshipService {
    #[must_use]
    pub const fn new(store: Store, scope: EngagementScope) -> Self {
        Self { store, scope }
    }

    /// The post filter for "existing like/share" lookups under the configured scope.
    const fn scoped(&self, post_id: Uuid) -> Option<Uuid> {
        match self.scope {
            EngagementScope::Account => None,
            EngagementScope::Post => Some(post_id),
        }
    }

    async fn require_post(&self, post_id: Uuid) -> ServiceResult<()> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(ServiceError::not_found("Post"));
        }
        Ok(())
    }

    async fn target(&self, username: &str) -> ServiceResult<Uuid> {
        self.store
            .get_account_by_username(&normalize_handle(username))
            .await?
            .map(|account| account.id)
            .ok_or_else(|| ServiceError::not_found("Account"))
    }
}

#[async_trait]
impl RelationshipService for SeaOrmRelationshipService {
    async fn follow(&self, actor_id: Uuid, target_username: &str) -> ServiceResult<()> {
        let target_id = self.target(target_username).await?;

        if target_id == actor_id {
            return Err(ServiceError::invalid("cannot follow yourself"));
        }

        match self.store.insert_follow(actor_id, target_id).await? {
            Outcome::Done(()) => {
                metrics::counter!("follows_total").increment(1);
                info!(follower = %actor_id, followed = %target_id, "Follow edge created");
                Ok(())
            }
            Outcome::Conflict(_) => Err(ServiceError::AlreadyFollowed),
        }
    }

    async fn unfollow(&self, actor_id: Uuid, target_username: &str) -> ServiceResult<()> {
        let target_id = self.target(target_username).await?;

        let removed = self.store.delete_follow(actor_id, target_id).await?;
        debug!(follower = %actor_id, followed = %target_id, removed, "Unfollow");
        Ok(())
    }

    async fn toggle_like(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<LikeOutcome> {
        self.require_post(post_id).await?;

        let existing = self.store.likes_by(actor_id, self.scoped(post_id)).await?;
        if !existing.is_empty() {
            let ids = existing.into_iter().map(|like| like.id).collect();
            self.store.delete_likes(ids).await?;
            return Ok(LikeOutcome::Unliked);
        }

        match self.store.insert_like(actor_id, post_id).await? {
            Outcome::Done(like) => {
                metrics::counter!("likes_total").increment(1);
                debug!(like_id = %like.id, liker = %actor_id, post = %post_id, "Like recorded");
            }
            Outcome::Conflict(constraint) => {
                debug!(
                    liker = %actor_id,
                    post = %post_id,
                    constraint = %constraint,
                    "Concurrent like already recorded"
                );
            }
        }
        Ok(LikeOutcome::Liked)
    }

    async fn share(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Share> {
        self.require_post(post_id).await?;

        let existing = self.store.shares_by(actor_id, self.scoped(post_id)).await?;
        if !existing.is_empty() {
            return Err(ServiceError::invalid("post already shared"));
        }

        match self.store.insert_share(actor_id, post_id).await? {
            Outcome::Done(share) => {
                metrics::counter!("shares_total").increment(1);
                Ok(share.into())
            }
            Outcome::Conflict(_) => Err(ServiceError::invalid("post already shared")),
        }
    }

    async fn unshare(&self, actor_id: Uuid, share_id: Uuid) -> ServiceResult<()> {
        let share = self
            .store
            .get_share(share_id)
            .await?
            .filter(|share| share.sharer_id == actor_id)
            .ok_or_else(|| ServiceError::invalid("share not found"))?;

        if !self.store.delete_share(share.id).await? {
            return Err(ServiceError::invalid("share not found"));
        }
        Ok(())
    }

    async fn shares_of(&self, actor_id: Uuid) -> ServiceResult<Vec<Share>> {
        let shares = self.store.shares_by(actor_id, None).await?;
        Ok(shares.into_iter().map(Share::from).collect())
    }

    async fn attach_tag(&self, post_id: Uuid, raw_name: &str) -> ServiceResult<bool> {
        self.require_post(post_id).await?;

        let name = required_tag(raw_name)?;

        Ok(self.store.attach_tag(post_id, &name).await?)
    }

    async fn create_tag(&self, raw_name: &str) -> ServiceResult<Tag> {
        let name = required_tag(raw_name)?;

        match self.store.create_tag(&name).await? {
            Outcome::Done(tag) => Ok(tag.into()),
            Outcome::Conflict(_) => Err(ServiceError::AlreadyExists(Field::Tag)),
        }
    }

    async fn replace_tags(&self, post_id: Uuid, raw_names: &[String]) -> ServiceResult<()> {
        self.require_post(post_id).await?;

        let names = normalize_tags(raw_names)?;
        self.store.replace_tags(post_id, &names).await?;
        Ok(())
    }

    async fn posts_by_tag(&self, raw_name: &str) -> ServiceResult<Vec<Post>> {
        let Some(name) = normalize_tag(raw_name) else {
            return Ok(vec![]);
        };

        let posts = self.store.posts_with_tag(&name).await?;
        Ok(posts.into_iter().map(Post::from).collect())
    }
}
