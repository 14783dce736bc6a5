use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, NotSet, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Column names a list query may order by.
pub const SORTABLE_COLUMNS: [&str; 6] = ["id", "name", "username", "email", "created_at", "updated_at"];

/// Resolve a list `order_field` to a column. Unknown names never reach SQL.
pub fn sortable_column(name: &str) -> Option<Column> {
    match name {
        "id" => Some(Column::Id),
        "name" => Some(Column::Name),
        "username" => Some(Column::Username),
        "email" => Some(Column::Email),
        "created_at" => Some(Column::CreatedAt),
        "updated_at" => Some(Column::UpdatedAt),
        _ => None,
    }
}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str, username: &str, email: &str) -> Result<Model, errors::ModelError> {
    if !email.contains('@') { return Err(errors::ModelError::Validation("invalid email".into())); }
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if username.trim().is_empty() { return Err(errors::ModelError::Validation("username required".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Insert the bootstrap member when the table is empty. Returns whether a row was written.
pub async fn seed_defaults(db: &DatabaseConnection) -> Result<bool, errors::ModelError> {
    let txn = db.begin().await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    let existing = Entity::find().one(&txn).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    let seeded = if existing.is_none() {
        create(&txn, "Adam Nasrudin", "adamnasrudin03", "adamnasrudin@example.com").await?;
        true
    } else {
        false
    };
    txn.commit().await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_with_config;
    use configs::DatabaseConfig;
    use migration::MigratorTrait;

    async fn memory_db() -> anyhow::Result<DatabaseConnection> {
        let cfg = DatabaseConfig { url: "sqlite::memory:".into(), max_connections: 1, min_connections: 1, ..Default::default() };
        let db = connect_with_config(&cfg).await?;
        migration::Migrator::up(&db, None).await?;
        Ok(db)
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() -> anyhow::Result<()> {
        let db = memory_db().await?;
        assert!(matches!(create(&db, "A", "u1", "not-an-email").await, Err(errors::ModelError::Validation(_))));
        assert!(matches!(create(&db, " ", "u1", "a@x.com").await, Err(errors::ModelError::Validation(_))));
        assert!(matches!(create(&db, "A", "", "a@x.com").await, Err(errors::ModelError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unique_email_is_enforced_by_schema() -> anyhow::Result<()> {
        let db = memory_db().await?;
        let first = create(&db, "A", "u1", "a@x.com").await?;
        assert!(first.id > 0);
        let dup = create(&db, "B", "u2", "a@x.com").await;
        assert!(matches!(dup, Err(errors::ModelError::Db(_))));
        Ok(())
    }

    #[tokio::test]
    async fn seed_defaults_is_idempotent() -> anyhow::Result<()> {
        let db = memory_db().await?;
        assert!(seed_defaults(&db).await?);
        assert!(!seed_defaults(&db).await?);
        let rows = Entity::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "adamnasrudin03");
        Ok(())
    }

    #[test]
    fn every_sortable_name_resolves() {
        for name in SORTABLE_COLUMNS {
            assert!(sortable_column(name).is_some(), "{name}");
        }
        assert!(sortable_column("password").is_none());
    }
}
