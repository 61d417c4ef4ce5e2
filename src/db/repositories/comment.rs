use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::now_rfc3339;
use crate::entities::{comments, prelude::*};

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        post_id: Uuid,
        commenter_id: Uuid,
        body: String,
    ) -> Result<comments::Model> {
        let now = now_rfc3339();
        comments::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            commenter_id: Set(commenter_id),
            body: Set(body),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert comment")
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<comments::Model>> {
        Comments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query comment")
    }

    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<comments::Model>> {
        Comments::find()
            .filter(comments::Column::PostId.eq(post_id))
            .order_by_asc(comments::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list comments of post")
    }

    pub async fn update_body(
        &self,
        comment: comments::Model,
        body: String,
    ) -> Result<comments::Model> {
        let mut active: comments::ActiveModel = comment.into();
        active.body = Set(body);
        active.updated_at = Set(now_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update comment")
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = Comments::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected > 0)
    }
}
