use async_trait::async_trait;

use crate::pagination::ListQuery;

use super::domain::{DetailQuery, TeamMember};
use super::errors::RepositoryError;

/// Store gateway for team member rows.
#[async_trait]
pub trait TeamMemberRepository: Send + Sync + 'static {
    /// First row matching every populated filter, or `None` when nothing matches.
    async fn find_one(&self, query: &DetailQuery) -> Result<Option<TeamMember>, RepositoryError>;
    /// Persist a new row; the store assigns `id` and timestamps.
    async fn insert(&self, member: TeamMember) -> Result<TeamMember, RepositoryError>;
    /// Full-row update by `id`. Matching zero rows is not an error.
    async fn update(&self, member: &TeamMember) -> Result<(), RepositoryError>;
    async fn delete(&self, id: u64) -> Result<(), RepositoryError>;
    async fn find_many(&self, query: &ListQuery) -> Result<Vec<TeamMember>, RepositoryError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::cmp::Ordering as CmpOrdering;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use crate::pagination::{OrderDirection, Projection};

    /// Applies the same filter, window and ordering rules as the SQL backend
    /// and records every call so tests can assert on the traffic.
    #[derive(Default)]
    pub struct MockTeamMemberRepository {
        rows: Mutex<BTreeMap<u64, TeamMember>>,
        last_id: AtomicU64,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        find_one_calls: Mutex<Vec<DetailQuery>>,
        find_many_calls: Mutex<Vec<ListQuery>>,
        inserts: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl MockTeamMemberRepository {
        pub fn with_rows(rows: impl IntoIterator<Item = TeamMember>) -> Self {
            let repo = Self::default();
            {
                let mut map = repo.rows.lock().unwrap();
                for row in rows {
                    repo.last_id.fetch_max(row.id, Ordering::SeqCst);
                    map.insert(row.id, row);
                }
            }
            repo
        }

        /// `count` rows with ids `1..=count` and distinct unique keys.
        pub fn with_generated(count: u64) -> Self {
            Self::with_rows((1..=count).map(|i| TeamMember {
                id: i,
                name: format!("Member {i}"),
                username: format!("user{i:04}"),
                email: format!("user{i:04}@example.com"),
                created_at: Some(Utc::now()),
                updated_at: Some(Utc::now()),
            }))
        }

        pub fn fail_reads(&self, fail: bool) { self.fail_reads.store(fail, Ordering::SeqCst); }

        pub fn fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }

        pub fn row(&self, id: u64) -> Option<TeamMember> { self.rows.lock().unwrap().get(&id).cloned() }

        pub fn find_one_calls(&self) -> Vec<DetailQuery> { self.find_one_calls.lock().unwrap().clone() }

        pub fn find_many_calls(&self) -> Vec<ListQuery> { self.find_many_calls.lock().unwrap().clone() }

        pub fn insert_count(&self) -> usize { self.inserts.load(Ordering::SeqCst) }

        pub fn update_count(&self) -> usize { self.updates.load(Ordering::SeqCst) }

        pub fn delete_count(&self) -> usize { self.deletes.load(Ordering::SeqCst) }

        fn check_reads(&self) -> Result<(), RepositoryError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepositoryError::Backend("mock read failure".into()));
            }
            Ok(())
        }

        fn check_writes(&self) -> Result<(), RepositoryError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RepositoryError::Backend("mock write failure".into()));
            }
            Ok(())
        }
    }

    fn project(member: &TeamMember, projection: Projection) -> TeamMember {
        match projection {
            Projection::All => member.clone(),
            Projection::IdOnly => TeamMember::id_only(member.id),
        }
    }

    fn compare_by(field: &str, a: &TeamMember, b: &TeamMember) -> CmpOrdering {
        match field {
            "name" => a.name.cmp(&b.name),
            "username" => a.username.cmp(&b.username),
            "email" => a.email.cmp(&b.email),
            "created_at" => a.created_at.cmp(&b.created_at),
            "updated_at" => a.updated_at.cmp(&b.updated_at),
            _ => a.id.cmp(&b.id),
        }
    }

    #[async_trait]
    impl TeamMemberRepository for MockTeamMemberRepository {
        async fn find_one(&self, query: &DetailQuery) -> Result<Option<TeamMember>, RepositoryError> {
            self.find_one_calls.lock().unwrap().push(query.clone());
            self.check_reads()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows.values().find(|m| query.matches(m)).map(|m| project(m, query.projection)))
        }

        async fn insert(&self, member: TeamMember) -> Result<TeamMember, RepositoryError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.check_writes()?;
            let mut rows = self.rows.lock().unwrap();
            if rows.values().any(|m| m.email == member.email || m.username == member.username) {
                return Err(RepositoryError::Backend("unique constraint violated".into()));
            }
            let now = Utc::now();
            let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
            let created = TeamMember { id, created_at: Some(now), updated_at: Some(now), ..member };
            rows.insert(id, created.clone());
            Ok(created)
        }

        async fn update(&self, member: &TeamMember) -> Result<(), RepositoryError> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.check_writes()?;
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows.get_mut(&member.id) {
                existing.name = member.name.clone();
                existing.username = member.username.clone();
                existing.email = member.email.clone();
                existing.updated_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn delete(&self, id: u64) -> Result<(), RepositoryError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.check_writes()?;
            self.rows.lock().unwrap().remove(&id);
            Ok(())
        }

        async fn find_many(&self, query: &ListQuery) -> Result<Vec<TeamMember>, RepositoryError> {
            self.find_many_calls.lock().unwrap().push(query.clone());
            self.check_reads()?;
            let rows = self.rows.lock().unwrap();
            let mut matched: Vec<&TeamMember> = rows
                .values()
                .filter(|m| query.search.is_empty() || m.email.contains(&query.search))
                .collect();
            if let Some((field, direction)) = query.ordering() {
                matched.sort_by(|a, b| {
                    let ord = compare_by(field, a, b);
                    if direction == OrderDirection::Desc { ord.reverse() } else { ord }
                });
            }
            let (skip, take) = match query.window() {
                Some((offset, limit)) => (offset as usize, limit as usize),
                None => (0, usize::MAX),
            };
            Ok(matched.into_iter().skip(skip).take(take).map(|m| project(m, query.projection)).collect())
        }
    }
}
