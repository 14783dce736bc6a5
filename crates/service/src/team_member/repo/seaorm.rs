use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, Order, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::{error, warn};

use models::team_member;

use crate::pagination::{ListQuery, OrderDirection, Projection};
use crate::team_member::domain::{DetailQuery, TeamMember};
use crate::team_member::errors::RepositoryError;
use crate::team_member::repository::TeamMemberRepository;

pub struct SeaOrmTeamMemberRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmTeamMemberRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

impl From<OrderDirection> for Order {
    fn from(d: OrderDirection) -> Self {
        match d {
            OrderDirection::Asc => Order::Asc,
            OrderDirection::Desc => Order::Desc,
        }
    }
}

/// Ids above `i64::MAX` cannot exist in the table.
fn db_id(id: u64) -> Option<i64> { i64::try_from(id).ok() }

fn backend(op: &'static str) -> impl FnOnce(sea_orm::DbErr) -> RepositoryError {
    move |e| {
        error!(op, error = %e, "team member query failed");
        RepositoryError::Backend(e.to_string())
    }
}

async fn fetch(db: &DatabaseConnection, select: Select<team_member::Entity>, projection: Projection, op: &'static str) -> Result<Vec<TeamMember>, RepositoryError> {
    match projection {
        Projection::All => {
            let rows = select.all(db).await.map_err(backend(op))?;
            Ok(rows.into_iter().map(TeamMember::from).collect())
        }
        Projection::IdOnly => {
            let ids: Vec<i64> = select
                .select_only()
                .column(team_member::Column::Id)
                .into_tuple()
                .all(db)
                .await
                .map_err(backend(op))?;
            Ok(ids.into_iter().map(|id| TeamMember::id_only(u64::try_from(id).unwrap_or_default())).collect())
        }
    }
}

#[async_trait]
impl TeamMemberRepository for SeaOrmTeamMemberRepository {
    async fn find_one(&self, query: &DetailQuery) -> Result<Option<TeamMember>, RepositoryError> {
        let mut select = team_member::Entity::find();
        if let Some(id) = query.id {
            let Some(id) = db_id(id) else { return Ok(None) };
            select = select.filter(team_member::Column::Id.eq(id));
        }
        if let Some(id) = query.not_id.and_then(db_id) {
            select = select.filter(team_member::Column::Id.ne(id));
        }
        if let Some(email) = &query.email {
            select = select.filter(team_member::Column::Email.eq(email.as_str()));
        }
        if let Some(username) = &query.username {
            select = select.filter(team_member::Column::Username.eq(username.as_str()));
        }
        let select = select.order_by_asc(team_member::Column::Id).limit(1);
        let mut rows = fetch(&self.db, select, query.projection, "team_member.find_one").await?;
        Ok(rows.pop())
    }

    async fn insert(&self, member: TeamMember) -> Result<TeamMember, RepositoryError> {
        let now = Utc::now().into();
        let am = team_member::ActiveModel {
            id: NotSet,
            name: Set(member.name),
            username: Set(member.username),
            email: Set(member.email),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = am.insert(&self.db).await.map_err(backend("team_member.insert"))?;
        Ok(created.into())
    }

    async fn update(&self, member: &TeamMember) -> Result<(), RepositoryError> {
        let Some(id) = db_id(member.id) else { return Ok(()) };
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = team_member::Entity::update_many()
            .col_expr(team_member::Column::Name, Expr::value(member.name.clone()))
            .col_expr(team_member::Column::Username, Expr::value(member.username.clone()))
            .col_expr(team_member::Column::Email, Expr::value(member.email.clone()))
            .col_expr(team_member::Column::UpdatedAt, Expr::value(now))
            .filter(team_member::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(backend("team_member.update"))?;
        // A concurrent delete makes this a silent no-op; the caller still sees success.
        if result.rows_affected == 0 {
            warn!(id = member.id, "team member update matched no rows");
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<(), RepositoryError> {
        let Some(id) = db_id(id) else { return Ok(()) };
        team_member::Entity::delete_by_id(id).exec(&self.db).await.map_err(backend("team_member.delete"))?;
        Ok(())
    }

    async fn find_many(&self, query: &ListQuery) -> Result<Vec<TeamMember>, RepositoryError> {
        let mut select = team_member::Entity::find();
        if !query.search.is_empty() {
            select = select.filter(team_member::Column::Email.contains(query.search.as_str()));
        }
        if let Some((offset, limit)) = query.window() {
            select = select.offset(offset).limit(limit);
        }
        if let Some((field, direction)) = query.ordering() {
            if let Some(column) = team_member::sortable_column(field) {
                select = select.order_by(column, direction.into());
            }
        }
        fetch(&self.db, select, query.projection, "team_member.find_many").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    async fn repo_with(count: usize) -> Result<SeaOrmTeamMemberRepository, anyhow::Error> {
        let repo = SeaOrmTeamMemberRepository::new(get_db().await?);
        for i in 1..=count {
            repo.insert(TeamMember::new(format!("Member {i}"), format!("user{i:02}"), format!("user{i:02}@example.com"))).await?;
        }
        Ok(repo)
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() -> Result<(), anyhow::Error> {
        let repo = repo_with(0).await?;
        let created = repo.insert(TeamMember::new("A", "u1", "a@x.com")).await?;
        assert!(created.exists());
        assert!(created.created_at.is_some());
        assert_eq!(created.username, "u1");

        let dup = repo.insert(TeamMember::new("B", "u1", "b@x.com")).await;
        assert!(matches!(dup, Err(RepositoryError::Backend(_))));
        Ok(())
    }

    #[tokio::test]
    async fn find_one_applies_every_filter() -> Result<(), anyhow::Error> {
        let repo = repo_with(3).await?;

        let by_id = repo.find_one(&DetailQuery::by_id(2)).await?.unwrap();
        assert_eq!(by_id.email, "user02@example.com");

        assert!(repo.find_one(&DetailQuery::by_id(99)).await?.is_none());
        assert!(repo.find_one(&DetailQuery::by_id(u64::MAX)).await?.is_none());

        let by_email = DetailQuery::default().email("user03@example.com");
        assert_eq!(repo.find_one(&by_email).await?.map(|m| m.id), Some(3));
        assert!(repo.find_one(&by_email.excluding(3)).await?.is_none());

        let mismatch = DetailQuery::by_id(1).username("user02");
        assert!(repo.find_one(&mismatch).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn id_projection_leaves_other_fields_empty() -> Result<(), anyhow::Error> {
        let repo = repo_with(1).await?;
        let found = repo
            .find_one(&DetailQuery::default().username("user01").project(Projection::IdOnly))
            .await?
            .unwrap();
        assert_eq!(found, TeamMember::id_only(1));
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_attributes_and_tolerates_missing_rows() -> Result<(), anyhow::Error> {
        let repo = repo_with(1).await?;
        let mut member = repo.find_one(&DetailQuery::by_id(1)).await?.unwrap();
        member.name = "Renamed".into();
        member.email = "renamed@example.com".into();
        repo.update(&member).await?;

        let reloaded = repo.find_one(&DetailQuery::by_id(1)).await?.unwrap();
        assert_eq!(reloaded.name, "Renamed");
        assert_eq!(reloaded.email, "renamed@example.com");
        assert_eq!(reloaded.created_at, member.created_at);

        repo.update(&TeamMember { id: 42, ..member }).await?;
        Ok(())
    }

    #[tokio::test]
    async fn delete_removes_row() -> Result<(), anyhow::Error> {
        let repo = repo_with(2).await?;
        repo.delete(1).await?;
        assert!(repo.find_one(&DetailQuery::by_id(1)).await?.is_none());
        assert!(repo.find_one(&DetailQuery::by_id(2)).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn find_many_windows_orders_and_searches() -> Result<(), anyhow::Error> {
        let repo = repo_with(12).await?;

        let first = repo.find_many(&ListQuery::default()).await?;
        assert_eq!(first.len(), 10);

        let second = repo.find_many(&ListQuery { page: 2, ..Default::default() }).await?;
        assert_eq!(second.len(), 2);

        let desc = ListQuery {
            limit: 3,
            order_field: Some("id".into()),
            order_direction: Some(OrderDirection::Desc),
            ..Default::default()
        };
        let ids: Vec<u64> = repo.find_many(&desc).await?.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![12, 11, 10]);

        let search = ListQuery { search: "user1".into(), no_limit: true, ..Default::default() };
        assert_eq!(repo.find_many(&search).await?.len(), 3);

        let raw = ListQuery { offset: 5, limit: 100, skip_defaults: true, projection: Projection::IdOnly, ..Default::default() };
        let tail = repo.find_many(&raw).await?;
        assert_eq!(tail.len(), 7);
        assert!(tail.iter().all(|m| m.email.is_empty()));
        Ok(())
    }
}
