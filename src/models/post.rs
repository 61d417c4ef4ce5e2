use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{comments, likes, posts, shares, tags};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub caption: String,
    pub image_url: String,
    pub account_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

impl From<posts::Model> for Post {
    fn from(model: posts::Model) -> Self {
        Self {
            id: model.id,
            caption: model.caption,
            image_url: model.image_url,
            account_id: model.account_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl From<tags::Model> for Tag {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub liker_id: Uuid,
    pub post_id: Uuid,
    pub created_at: String,
}

impl From<likes::Model> for Like {
    fn from(model: likes::Model) -> Self {
        Self {
            id: model.id,
            liker_id: model.liker_id,
            post_id: model.post_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub sharer_id: Uuid,
    pub post_id: Uuid,
    pub created_at: String,
}

impl From<shares::Model> for Share {
    fn from(model: shares::Model) -> Self {
        Self {
            id: model.id,
            sharer_id: model.sharer_id,
            post_id: model.post_id,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub commenter_id: Uuid,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<comments::Model> for Comment {
    fn from(model: comments::Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            commenter_id: model.commenter_id,
            body: model.body,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A post with everything hanging off it.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<Tag>,
    pub likes: Vec<Like>,
    pub shares: Vec<Share>,
    pub comments: Vec<Comment>,
}

/// Result of [`toggle_like`](crate::services::RelationshipService::toggle_like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeOutcome {
    Liked,
    Unliked,
}

/// Canonical tag form: trimmed, lower-cased, `#`-prefixed. `None` for blank input.
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('#').trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("#{}", trimmed.to_lowercase()))
}
