use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::db::{Outcome, now_rfc3339, unique_violation};
use crate::entities::{likes, prelude::*, shares};

/// Likes and shares.
pub struct EngagementRepository {
    conn: DatabaseConnection,
}

impl EngagementRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn likes_by(
        &self,
        liker_id: Uuid,
        post_id: Option<Uuid>,
    ) -> Result<Vec<likes::Model>> {
        let mut query = Likes::find().filter(likes::Column::LikerId.eq(liker_id));
        if let Some(post_id) = post_id {
            query = query.filter(likes::Column::PostId.eq(post_id));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to query likes of account")
    }

    pub async fn likes_of_post(&self, post_id: Uuid) -> Result<Vec<likes::Model>> {
        Likes::find()
            .filter(likes::Column::PostId.eq(post_id))
            .order_by_asc(likes::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query likes of post")
    }

    pub async fn insert_like(
        &self,
        liker_id: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<likes::Model>> {
        let active = likes::ActiveModel {
            id: Set(Uuid::new_v4()),
            liker_id: Set(liker_id),
            post_id: Set(post_id),
            created_at: Set(now_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Outcome::Done(model)),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Ok(Outcome::Conflict(constraint)),
                None => Err(e).context("Failed to insert like"),
            },
        }
    }

    pub async fn delete_likes(&self, ids: Vec<Uuid>) -> Result<u64> {
        let result = Likes::delete_many()
            .filter(likes::Column::Id.is_in(ids))
            .exec(&self.conn)
            .await
            .context("Failed to delete likes")?;

        Ok(result.rows_affected)
    }

    pub async fn get_share(&self, id: Uuid) -> Result<Option<shares::Model>> {
        Shares::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query share")
    }

    pub async fn shares_by(
        &self,
        sharer_id: Uuid,
        post_id: Option<Uuid>,
    ) -> Result<Vec<shares::Model>> {
        let mut query = Shares::find().filter(shares::Column::SharerId.eq(sharer_id));
        if let Some(post_id) = post_id {
            query = query.filter(shares::Column::PostId.eq(post_id));
        }

        query
            .order_by_desc(shares::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query shares of account")
    }

    pub async fn shares_of_post(&self, post_id: Uuid) -> Result<Vec<shares::Model>> {
        Shares::find()
            .filter(shares::Column::PostId.eq(post_id))
            .order_by_asc(shares::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query shares of post")
    }

    pub async fn insert_share(
        &self,
        sharer_id: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<shares::Model>> {
        let active = shares::ActiveModel {
            id: Set(Uuid::new_v4()),
            sharer_id: Set(sharer_id),
            post_id: Set(post_id),
            created_at: Set(now_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Outcome::Done(model)),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Ok(Outcome::Conflict(constraint)),
                None => Err(e).context("Failed to insert share"),
            },
        }
    }

    pub async fn delete_share(&self, id: Uuid) -> Result<bool> {
        let result = Shares::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete share")?;

        Ok(result.rows_affected > 0)
    }
}
