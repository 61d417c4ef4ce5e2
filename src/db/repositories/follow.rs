use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::db::{Outcome, now_rfc3339, unique_violation};
use crate::entities::{accounts, follows, prelude::*};

pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the edge; a second insert of the same pair reports a conflict.
    pub async fn insert(&self, follower_id: Uuid, followed_id: Uuid) -> Result<Outcome<()>> {
        let active = follows::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(now_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(Outcome::Done(())),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Ok(Outcome::Conflict(constraint)),
                None => Err(e).context("Failed to insert follow edge"),
            },
        }
    }

    /// Returns whether an edge was removed.
    pub async fn delete(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let result = Follows::delete_by_id((follower_id, followed_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete follow edge")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn exists(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        let edge = Follows::find_by_id((follower_id, followed_id))
            .one(&self.conn)
            .await
            .context("Failed to query follow edge")?;

        Ok(edge.is_some())
    }

    /// Accounts following `account_id`.
    pub async fn followers_of(&self, account_id: Uuid) -> Result<Vec<accounts::Model>> {
        Accounts::find()
            .join(JoinType::InnerJoin, follows::Relation::Follower.def().rev())
            .filter(follows::Column::FollowedId.eq(account_id))
            .order_by_asc(follows::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query followers")
    }

    /// Accounts `account_id` follows.
    pub async fn following_of(&self, account_id: Uuid) -> Result<Vec<accounts::Model>> {
        Accounts::find()
            .join(JoinType::InnerJoin, follows::Relation::Followed.def().rev())
            .filter(follows::Column::FollowerId.eq(account_id))
            .order_by_asc(follows::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query followed accounts")
    }
}
