use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::db::{Outcome, unique_violation};
use crate::entities::{post_tags, posts, prelude::*, tags};

pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<tags::Model>> {
        Tags::find()
            .filter(tags::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query tag by name")
    }

    /// `name` must already be normalized.
    pub async fn create(&self, name: &str) -> Result<Outcome<tags::Model>> {
        insert_tag(&self.conn, name).await
    }

    /// Links `name` to the post, creating the tag first when needed.
    /// Returns `false` when the link already existed.
    pub async fn attach(&self, post_id: Uuid, name: &str) -> Result<bool> {
        attach_tag(&self.conn, post_id, name).await
    }

    /// Clears every link of the post and attaches `names`, atomically.
    pub async fn replace(&self, post_id: Uuid, names: &[String]) -> Result<()> {
        let txn = self.conn.begin().await?;

        clear_links(&txn, post_id).await?;
        for name in names {
            attach_tag(&txn, post_id, name).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    pub async fn tags_of_post(&self, post_id: Uuid) -> Result<Vec<tags::Model>> {
        let Some(post) = Posts::find_by_id(post_id).one(&self.conn).await? else {
            return Ok(vec![]);
        };

        post.find_related(Tags)
            .order_by_asc(tags::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to query tags of post")
    }

    pub async fn posts_with_tag(&self, name: &str) -> Result<Vec<posts::Model>> {
        let Some(tag) = self.get_by_name(name).await? else {
            return Ok(vec![]);
        };

        tag.find_related(Posts)
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query posts by tag")
    }
}

async fn insert_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Outcome<tags::Model>> {
    let active = tags::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    };

    match active.insert(conn).await {
        Ok(model) => Ok(Outcome::Done(model)),
        Err(e) => match unique_violation(&e) {
            Some(constraint) => Ok(Outcome::Conflict(constraint)),
            None => Err(e).context("Failed to insert tag"),
        },
    }
}

pub(crate) async fn attach_tag<C: ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    name: &str,
) -> Result<bool> {
    let existing = Tags::find()
        .filter(tags::Column::Name.eq(name))
        .one(conn)
        .await?;

    let tag = match existing {
        Some(tag) => tag,
        None => match insert_tag(conn, name).await? {
            Outcome::Done(tag) => tag,
            // Lost a race with a concurrent creator.
            Outcome::Conflict(_) => Tags::find()
                .filter(tags::Column::Name.eq(name))
                .one(conn)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Tag {name} vanished after conflict"))?,
        },
    };

    let link = post_tags::ActiveModel {
        tag_id: Set(tag.id),
        post_id: Set(post_id),
    };

    match PostTags::insert(link).exec(conn).await {
        Ok(_) => Ok(true),
        Err(e) if unique_violation(&e).is_some() => Ok(false),
        Err(e) => Err(e).context("Failed to link tag to post"),
    }
}

pub(crate) async fn clear_links<C: ConnectionTrait>(conn: &C, post_id: Uuid) -> Result<u64> {
    let result = PostTags::delete_many()
        .filter(post_tags::Column::PostId.eq(post_id))
        .exec(conn)
        .await
        .context("Failed to clear tag links")?;

    Ok(result.rows_affected)
}
