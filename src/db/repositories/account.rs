use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::{Outcome, now_rfc3339, unique_violation};
use crate::entities::{accounts, comments, follows, likes, post_tags, posts, prelude::*, shares};

/// Column values for a fresh account row.
#[derive(Debug, Clone)]
pub struct NewAccountRow {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub gender: String,
    pub about: String,
    pub profile_url: String,
    pub dob: chrono::NaiveDate,
}

/// Column updates applied in a single statement; `None` leaves a column unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub gender: Option<String>,
    pub about: Option<String>,
    pub dob: Option<chrono::NaiveDate>,
    pub profile_url: Option<String>,
    pub password_hash: Option<String>,
    pub is_verified: Option<bool>,
}

impl AccountUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.username.is_none()
            && self.gender.is_none()
            && self.about.is_none()
            && self.dob.is_none()
            && self.profile_url.is_none()
            && self.password_hash.is_none()
            && self.is_verified.is_none()
    }
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<accounts::Model>> {
        Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<accounts::Model>> {
        Accounts::find()
            .filter(accounts::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<accounts::Model>> {
        Accounts::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")
    }

    pub async fn insert(&self, row: NewAccountRow) -> Result<Outcome<accounts::Model>> {
        let now = now_rfc3339();
        let active = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            full_name: Set(row.full_name),
            email: Set(row.email),
            username: Set(row.username),
            password_hash: Set(row.password_hash),
            gender: Set(row.gender),
            about: Set(row.about),
            profile_url: Set(row.profile_url),
            dob: Set(row.dob),
            is_verified: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Outcome::Done(model)),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Ok(Outcome::Conflict(constraint)),
                None => Err(e).context("Failed to insert account"),
            },
        }
    }

    /// Applies every set field of `update` in one `UPDATE`, bumping `updated_at`.
    pub async fn update(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Outcome<accounts::Model>> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account for update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {id}"))?;

        if update.is_empty() {
            return Ok(Outcome::Done(account));
        }

        let mut active: accounts::ActiveModel = account.into();
        if let Some(v) = update.full_name {
            active.full_name = Set(v);
        }
        if let Some(v) = update.username {
            active.username = Set(v);
        }
        if let Some(v) = update.gender {
            active.gender = Set(v);
        }
        if let Some(v) = update.about {
            active.about = Set(v);
        }
        if let Some(v) = update.dob {
            active.dob = Set(v);
        }
        if let Some(v) = update.profile_url {
            active.profile_url = Set(v);
        }
        if let Some(v) = update.password_hash {
            active.password_hash = Set(v);
        }
        if let Some(v) = update.is_verified {
            active.is_verified = Set(v);
        }
        active.updated_at = Set(now_rfc3339());

        match active.update(&self.conn).await {
            Ok(model) => Ok(Outcome::Done(model)),
            Err(e) => match unique_violation(&e) {
                Some(constraint) => Ok(Outcome::Conflict(constraint)),
                None => Err(e).context("Failed to update account"),
            },
        }
    }

    /// Case-insensitive prefix match on the display name.
    pub async fn search_by_name_prefix(
        &self,
        prefix: &str,
        limit: u64,
    ) -> Result<Vec<accounts::Model>> {
        let escaped = prefix
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = LikeExpr::new(format!("{escaped}%")).escape('\\');

        Accounts::find()
            .filter(Expr::expr(Func::lower(Expr::col(accounts::Column::FullName))).like(pattern))
            .order_by_asc(accounts::Column::FullName)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to search accounts")
    }

    /// Removes the account and everything that references it.
    ///
    /// Returns the image URLs of the deleted posts so the caller can clean up
    /// stored assets.
    pub async fn delete(&self, id: Uuid) -> Result<Option<Vec<String>>> {
        let txn = self.conn.begin().await?;

        let Some(account) = Accounts::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        let owned_posts = Posts::find()
            .filter(posts::Column::AccountId.eq(id))
            .all(&txn)
            .await?;
        let post_ids: Vec<Uuid> = owned_posts.iter().map(|p| p.id).collect();

        if !post_ids.is_empty() {
            Comments::delete_many()
                .filter(comments::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
            Likes::delete_many()
                .filter(likes::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
            Shares::delete_many()
                .filter(shares::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
            PostTags::delete_many()
                .filter(post_tags::Column::PostId.is_in(post_ids.clone()))
                .exec(&txn)
                .await?;
            Posts::delete_many()
                .filter(posts::Column::Id.is_in(post_ids))
                .exec(&txn)
                .await?;
        }

        Comments::delete_many()
            .filter(comments::Column::CommenterId.eq(id))
            .exec(&txn)
            .await?;
        Likes::delete_many()
            .filter(likes::Column::LikerId.eq(id))
            .exec(&txn)
            .await?;
        Shares::delete_many()
            .filter(shares::Column::SharerId.eq(id))
            .exec(&txn)
            .await?;
        Follows::delete_many()
            .filter(
                follows::Column::FollowerId
                    .eq(id)
                    .or(follows::Column::FollowedId.eq(id)),
            )
            .exec(&txn)
            .await?;

        account.delete(&txn).await?;
        txn.commit().await?;

        Ok(Some(owned_posts.into_iter().map(|p| p.image_url).collect()))
    }
}
