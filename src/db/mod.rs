use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::entities::{accounts, comments, likes, posts, shares, tags};

pub mod migrator;
pub mod repositories;

pub use repositories::account::{AccountUpdate, NewAccountRow};

/// Result of a write guarded by a unique index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    /// Rejected by a unique constraint; carries the driver's description of it.
    Conflict(String),
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// The constraint description when `err` is a unique violation.
#[must_use]
pub fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        conn.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn follow_repo(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn engagement_repo(&self) -> repositories::engagement::EngagementRepository {
        repositories::engagement::EngagementRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    // ========== Accounts ==========

    pub async fn get_account(&self, id: Uuid) -> Result<Option<accounts::Model>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<accounts::Model>> {
        self.account_repo().get_by_email(email).await
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<accounts::Model>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn insert_account(&self, row: NewAccountRow) -> Result<Outcome<accounts::Model>> {
        self.account_repo().insert(row).await
    }

    pub async fn update_account(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Outcome<accounts::Model>> {
        self.account_repo().update(id, update).await
    }

    pub async fn search_accounts(&self, prefix: &str, limit: u64) -> Result<Vec<accounts::Model>> {
        self.account_repo()
            .search_by_name_prefix(prefix, limit)
            .await
    }

    /// `None` when no such account; otherwise the image URLs of the removed posts.
    pub async fn delete_account(&self, id: Uuid) -> Result<Option<Vec<String>>> {
        self.account_repo().delete(id).await
    }

    // ========== Follow graph ==========

    pub async fn insert_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<Outcome<()>> {
        self.follow_repo().insert(follower_id, followed_id).await
    }

    pub async fn delete_follow(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        self.follow_repo().delete(follower_id, followed_id).await
    }

    pub async fn follow_exists(&self, follower_id: Uuid, followed_id: Uuid) -> Result<bool> {
        self.follow_repo().exists(follower_id, followed_id).await
    }

    pub async fn followers_of(&self, account_id: Uuid) -> Result<Vec<accounts::Model>> {
        self.follow_repo().followers_of(account_id).await
    }

    pub async fn following_of(&self, account_id: Uuid) -> Result<Vec<accounts::Model>> {
        self.follow_repo().following_of(account_id).await
    }

    // ========== Posts ==========

    pub async fn create_post(
        &self,
        account_id: Uuid,
        caption: String,
        image_url: String,
        tags: &[String],
    ) -> Result<posts::Model> {
        self.post_repo()
            .create(account_id, caption, image_url, tags)
            .await
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<posts::Model>> {
        self.post_repo().get(id).await
    }

    pub async fn posts_of_account(&self, account_id: Uuid) -> Result<Vec<posts::Model>> {
        self.post_repo().list_by_account(account_id).await
    }

    pub async fn update_post(
        &self,
        id: Uuid,
        caption: Option<String>,
        image_url: Option<String>,
        tags: Option<&[String]>,
    ) -> Result<Option<posts::Model>> {
        self.post_repo().update(id, caption, image_url, tags).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<Option<posts::Model>> {
        self.post_repo().delete(id).await
    }

    // ========== Tags ==========

    pub async fn get_tag_by_name(&self, name: &str) -> Result<Option<tags::Model>> {
        self.tag_repo().get_by_name(name).await
    }

    pub async fn create_tag(&self, name: &str) -> Result<Outcome<tags::Model>> {
        self.tag_repo().create(name).await
    }

    pub async fn attach_tag(&self, post_id: Uuid, name: &str) -> Result<bool> {
        self.tag_repo().attach(post_id, name).await
    }

    pub async fn replace_tags(&self, post_id: Uuid, names: &[String]) -> Result<()> {
        self.tag_repo().replace(post_id, names).await
    }

    pub async fn tags_of_post(&self, post_id: Uuid) -> Result<Vec<tags::Model>> {
        self.tag_repo().tags_of_post(post_id).await
    }

    pub async fn posts_with_tag(&self, name: &str) -> Result<Vec<posts::Model>> {
        self.tag_repo().posts_with_tag(name).await
    }

    // ========== Likes & shares ==========

    pub async fn likes_by(
        &self,
        liker_id: Uuid,
        post_id: Option<Uuid>,
    ) -> Result<Vec<likes::Model>> {
        self.engagement_repo().likes_by(liker_id, post_id).await
    }

    pub async fn likes_of_post(&self, post_id: Uuid) -> Result<Vec<likes::Model>> {
        self.engagement_repo().likes_of_post(post_id).await
    }

    pub async fn insert_like(
        &self,
        liker_id: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<likes::Model>> {
        self.engagement_repo().insert_like(liker_id, post_id).await
    }

    pub async fn delete_likes(&self, ids: Vec<Uuid>) -> Result<u64> {
        self.engagement_repo().delete_likes(ids).await
    }

    pub async fn get_share(&self, id: Uuid) -> Result<Option<shares::Model>> {
        self.engagement_repo().get_share(id).await
    }

    pub async fn shares_by(
        &self,
        sharer_id: Uuid,
        post_id: Option<Uuid>,
    ) -> Result<Vec<shares::Model>> {
        self.engagement_repo().shares_by(sharer_id, post_id).await
    }

    pub async fn shares_of_post(&self, post_id: Uuid) -> Result<Vec<shares::Model>> {
        self.engagement_repo().shares_of_post(post_id).await
    }

    pub async fn insert_share(
        &self,
        sharer_id: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<shares::Model>> {
        self.engagement_repo().insert_share(sharer_id, post_id).await
    }

    pub async fn delete_share(&self, id: Uuid) -> Result<bool> {
        self.engagement_repo().delete_share(id).await
    }

    // ========== Comments ==========

    pub async fn insert_comment(
        &self,
        post_id: Uuid,
        commenter_id: Uuid,
        body: String,
    ) -> Result<comments::Model> {
        self.comment_repo().insert(post_id, commenter_id, body).await
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Option<comments::Model>> {
        self.comment_repo().get(id).await
    }

    pub async fn comments_of_post(&self, post_id: Uuid) -> Result<Vec<comments::Model>> {
        self.comment_repo().list_for_post(post_id).await
    }

    pub async fn update_comment(
        &self,
        comment: comments::Model,
        body: String,
    ) -> Result<comments::Model> {
        self.comment_repo().update_body(comment, body).await
    }

    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        self.comment_repo().delete(id).await
    }
}
