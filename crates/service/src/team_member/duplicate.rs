use std::sync::Arc;

use tracing::error;

use crate::pagination::Projection;

use super::domain::DetailQuery;
use super::errors::{TeamMemberError, UniqueField};
use super::repository::TeamMemberRepository;

/// Enforces email and username uniqueness across team members.
///
/// The two keys are checked with separate id-only lookups, email first; the
/// first collision is reported. `exclude_id` is the record being updated (its
/// own values never collide) or `0` on create.
pub struct DuplicateChecker<R: TeamMemberRepository> {
    repo: Arc<R>,
}

impl<R: TeamMemberRepository> DuplicateChecker<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn check(&self, email: &str, username: &str, exclude_id: u64) -> Result<(), TeamMemberError> {
        let by_email = DetailQuery::default().project(Projection::IdOnly).email(email).excluding(exclude_id);
        if self.taken(&by_email, "checking duplicate email").await? {
            return Err(TeamMemberError::Duplicate(UniqueField::Email));
        }

        let by_username = DetailQuery::default().project(Projection::IdOnly).username(username).excluding(exclude_id);
        if self.taken(&by_username, "checking duplicate username").await? {
            return Err(TeamMemberError::Duplicate(UniqueField::Username));
        }

        Ok(())
    }

    async fn taken(&self, query: &DetailQuery, op: &'static str) -> Result<bool, TeamMemberError> {
        match self.repo.find_one(query).await {
            Ok(found) => Ok(found.is_some_and(|m| m.exists())),
            Err(e) => {
                error!(op = "team_member.check_duplicate", error = %e, "{op} failed");
                Err(TeamMemberError::Store(op))
            }
        }
    }
}
