//! Create tweet table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tweet::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tweet::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tweet::Content).text().not_null())
                    .col(ColumnDef::new(Tweet::OwnerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Tweet::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tweet::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tweet_owner")
                            .from(Tweet::Table, Tweet::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: owner_id + created_at (per-user tweet feed)
        manager
            .create_index(
                Index::create()
                    .name("idx_tweet_owner_created_at")
                    .table(Tweet::Table)
                    .col(Tweet::OwnerId)
                    .col(Tweet::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tweet::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tweet {
    Table,
    Id,
    Content,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
