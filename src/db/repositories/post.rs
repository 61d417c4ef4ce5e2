use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::tag::{attach_tag, clear_links};
use crate::db::now_rfc3339;
use crate::entities::{comments, likes, post_tags, posts, prelude::*, shares};

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the post and links its (normalized) tags in one transaction.
    pub async fn create(
        &self,
        account_id: Uuid,
        caption: String,
        image_url: String,
        tags: &[String],
    ) -> Result<posts::Model> {
        let txn = self.conn.begin().await?;

        let now = now_rfc3339();
        let post = posts::ActiveModel {
            id: Set(Uuid::new_v4()),
            caption: Set(caption),
            image_url: Set(image_url),
            account_id: Set(account_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert post")?;

        for name in tags {
            attach_tag(&txn, post.id, name).await?;
        }

        txn.commit().await?;
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<posts::Model>> {
        Posts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post")
    }

    pub async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<posts::Model>> {
        Posts::find()
            .filter(posts::Column::AccountId.eq(account_id))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list posts of account")
    }

    /// Updates caption and image, and replaces tags when `tags` is set, atomically.
    pub async fn update(
        &self,
        id: Uuid,
        caption: Option<String>,
        image_url: Option<String>,
        tags: Option<&[String]>,
    ) -> Result<Option<posts::Model>> {
        let txn = self.conn.begin().await?;

        let Some(post) = Posts::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let mut active: posts::ActiveModel = post.into();
        if let Some(caption) = caption {
            active.caption = Set(caption);
        }
        if let Some(url) = image_url {
            active.image_url = Set(url);
        }
        active.updated_at = Set(now_rfc3339());
        let post = active.update(&txn).await?;

        if let Some(names) = tags {
            clear_links(&txn, id).await?;
            for name in names {
                attach_tag(&txn, id, name).await?;
            }
        }

        txn.commit().await?;
        Ok(Some(post))
    }

    /// Deletes the post with its comments, likes, shares and tag links.
    pub async fn delete(&self, id: Uuid) -> Result<Option<posts::Model>> {
        let txn = self.conn.begin().await?;

        let Some(post) = Posts::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        Comments::delete_many()
            .filter(comments::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        Likes::delete_many()
            .filter(likes::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        Shares::delete_many()
            .filter(shares::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        PostTags::delete_many()
            .filter(post_tags::Column::PostId.eq(id))
            .exec(&txn)
            .await?;
        Posts::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(Some(post))
    }
}
