//! Create `team_member` table.
//!
//! `email` and `username` carry unique constraints; the service layer checks
//! them first so callers get a field-specific error instead of a raw
//! constraint violation.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(big_integer(TeamMember::Id).auto_increment().primary_key())
                    .col(string_len(TeamMember::Name, 128).not_null())
                    .col(string_len(TeamMember::Username, 128).unique_key().not_null())
                    .col(string_len(TeamMember::Email, 255).unique_key().not_null())
                    .col(timestamp_with_time_zone(TeamMember::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(TeamMember::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TeamMember::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum TeamMember { Table, Id, Name, Username, Email, CreatedAt, UpdatedAt }
