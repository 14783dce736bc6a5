//! Migrator for the team member schema.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_team_member;
mod m20240101_000002_add_team_member_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_team_member::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000002_add_team_member_indexes::Migration),
        ]
    }
}
