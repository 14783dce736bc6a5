use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Ordered listing by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_team_member_created_at")
                    .table(TeamMember::Table)
                    .col(TeamMember::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_team_member_created_at").table(TeamMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TeamMember { Table, CreatedAt }
