use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::Gender).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::About)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Accounts::ProfileUrl).string().not_null())
                    .col(ColumnDef::new(Accounts::Dob).date().not_null())
                    .col(
                        ColumnDef::new(Accounts::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_full_name")
                    .table(Accounts::Table)
                    .col(Accounts::FullName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follows::FollowerId).uuid().not_null())
                    .col(ColumnDef::new(Follows::FollowedId).uuid().not_null())
                    .col(ColumnDef::new(Follows::CreatedAt).string().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_follows")
                            .col(Follows::FollowerId)
                            .col(Follows::FollowedId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_follower_id")
                            .from(Follows::Table, Follows::FollowerId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_follows_followed_id")
                            .from(Follows::Table, Follows::FollowedId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Posts::Caption)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Posts::ImageUrl).string().not_null())
                    .col(ColumnDef::new(Posts::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Posts::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Posts::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_posts_account_id")
                            .from(Posts::Table, Posts::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_posts_account_id")
                    .table(Posts::Table)
                    .col(Posts::AccountId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tags::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tags::Name).string().not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostTags::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostTags::TagId).uuid().not_null())
                    .col(ColumnDef::new(PostTags::PostId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_post_tags")
                            .col(PostTags::TagId)
                            .col(PostTags::PostId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_tag_id")
                            .from(PostTags::Table, PostTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_tags_post_id")
                            .from(PostTags::Table, PostTags::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        create_engagement_table(manager, Engagement::Likes).await?;
        create_engagement_table(manager, Engagement::Shares).await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostId).uuid().not_null())
                    .col(ColumnDef::new(Comments::CommenterId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Body).text().not_null())
                    .col(ColumnDef::new(Comments::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Comments::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_post_id")
                            .from(Comments::Table, Comments::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_commenter_id")
                            .from(Comments::Table, Comments::CommenterId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_post_id")
                    .table(Comments::Table)
                    .col(Comments::PostId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Posts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Follows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Clone, Copy)]
enum Engagement {
    Likes,
    Shares,
}

/// Likes and shares share a shape: `(id, actor, post, created_at)` with a
/// unique `(actor, post)` pair.
async fn create_engagement_table(
    manager: &SchemaManager<'_>,
    kind: Engagement,
) -> Result<(), DbErr> {
    let (table, id, actor, post, created_at, name) = match kind {
        Engagement::Likes => (
            Likes::Table.into_iden(),
            Likes::Id.into_iden(),
            Likes::LikerId.into_iden(),
            Likes::PostId.into_iden(),
            Likes::CreatedAt.into_iden(),
            "likes",
        ),
        Engagement::Shares => (
            Shares::Table.into_iden(),
            Shares::Id.into_iden(),
            Shares::SharerId.into_iden(),
            Shares::PostId.into_iden(),
            Shares::CreatedAt.into_iden(),
            "shares",
        ),
    };

    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(ColumnDef::new(id).uuid().not_null().primary_key())
                .col(ColumnDef::new(actor.clone()).uuid().not_null())
                .col(ColumnDef::new(post.clone()).uuid().not_null())
                .col(ColumnDef::new(created_at).string().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_post_id"))
                        .from(table.clone(), post.clone())
                        .to(Posts::Table, Posts::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_actor_id"))
                        .from(table.clone(), actor.clone())
                        .to(Accounts::Table, Accounts::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .on_update(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_{name}_actor_post"))
                .table(table)
                .col(actor)
                .col(post)
                .unique()
                .if_not_exists()
                .to_owned(),
        )
        .await
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    FullName,
    Email,
    Username,
    PasswordHash,
    Gender,
    About,
    ProfileUrl,
    Dob,
    IsVerified,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Follows {
    Table,
    FollowerId,
    FollowedId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    Caption,
    ImageUrl,
    AccountId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum PostTags {
    Table,
    TagId,
    PostId,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    Id,
    LikerId,
    PostId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Shares {
    Table,
    Id,
    SharerId,
    PostId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    CommenterId,
    Body,
    CreatedAt,
    UpdatedAt,
}
