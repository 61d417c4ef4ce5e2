//! Domain service for posts and their comments.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Comment, Post, PostDetail};
use crate::services::error::ServiceResult;
use crate::services::identity_service::Upload;
use crate::services::tokens::Subject;

#[derive(Debug, Clone)]
pub struct NewPost {
    pub caption: String,
    pub image: Upload,
    pub tags: Vec<String>,
}

/// Post edits; `None` leaves the field as is. `tags: Some(vec![])` clears all tags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostChanges {
    pub caption: Option<String>,
    #[serde(skip)]
    pub image: Option<Upload>,
    pub tags: Option<Vec<String>>,
}

#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    async fn create_post(&self, identity: &Subject, new: NewPost) -> ServiceResult<PostDetail>;

    async fn get_post(&self, post_id: Uuid) -> ServiceResult<PostDetail>;

    async fn posts_of(&self, username: &str) -> ServiceResult<Vec<Post>>;

    /// Only the owner may edit a post.
    async fn update_post(
        &self,
        identity: &Subject,
        post_id: Uuid,
        changes: PostChanges,
    ) -> ServiceResult<PostDetail>;

    async fn delete_post(&self, identity: &Subject, post_id: Uuid) -> ServiceResult<()>;

    async fn add_comment(
        &self,
        identity: &Subject,
        post_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment>;

    /// Rejects edits by anyone but the commenter and edits that change nothing.
    async fn update_comment(
        &self,
        identity: &Subject,
        comment_id: Uuid,
        body: &str,
    ) -> ServiceResult<Comment>;

    async fn delete_comment(&self, identity: &Subject, comment_id: Uuid) -> ServiceResult<()>;
}
