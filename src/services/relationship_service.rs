//! Domain service for the follow graph, likes, shares and tags.

use uuid::Uuid;

use crate::models::{LikeOutcome, Post, Share, Tag};
use crate::services::error::ServiceResult;

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// # Errors
    ///
    /// `AlreadyFollowed` when the edge exists, `InvalidOperation` on self-follow.
    async fn follow(&self, actor_id: Uuid, target_username: &str) -> ServiceResult<()>;

    /// Removing an absent edge succeeds.
    async fn unfollow(&self, actor_id: Uuid, target_username: &str) -> ServiceResult<()>;

    async fn toggle_like(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<LikeOutcome>;

    async fn share(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<Share>;

    /// Only the sharer may remove a share.
    async fn unshare(&self, actor_id: Uuid, share_id: Uuid) -> ServiceResult<()>;

    async fn shares_of(&self, actor_id: Uuid) -> ServiceResult<Vec<Share>>;

    /// Returns `false` when the tag was already linked to the post.
    async fn attach_tag(&self, post_id: Uuid, raw_name: &str) -> ServiceResult<bool>;

    async fn create_tag(&self, raw_name: &str) -> ServiceResult<Tag>;

    /// Clears and re-attaches the post's tags atomically.
    async fn replace_tags(&self, post_id: Uuid, raw_names: &[String]) -> ServiceResult<()>;

    /// Empty when the tag does not exist.
    async fn posts_by_tag(&self, raw_name: &str) -> ServiceResult<Vec<Post>>;
}
