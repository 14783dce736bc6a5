use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use configs::CacheConfig;

use crate::pagination::{ListQuery, PageMeta, Paginated, Projection, TOTAL_OVERSAMPLE};

use super::cache::{CacheBackend, CacheGateway};
use super::domain::{detail_cache_key, CreateRequest, DetailQuery, ListRequest, TeamMember, UpdateRequest};
use super::duplicate::DuplicateChecker;
use super::errors::TeamMemberError;
use super::repository::TeamMemberRepository;

/// Team member service configuration
#[derive(Clone, Debug)]
pub struct TeamMemberConfig {
    /// TTL of the entry written after a cache miss on the read path.
    pub detail_ttl: Duration,
}

impl Default for TeamMemberConfig {
    fn default() -> Self { Self { detail_ttl: Duration::from_secs(60) } }
}

impl From<&CacheConfig> for TeamMemberConfig {
    fn from(cfg: &CacheConfig) -> Self { Self { detail_ttl: cfg.detail_ttl() } }
}

/// Team member business service independent of web framework.
///
/// Reads are cache-aside; writes check uniqueness first and invalidate the
/// cached copy afterwards. Cache writes run as detached tasks, so a reader
/// may see a stale entry briefly after an update or delete.
pub struct TeamMemberService<R: TeamMemberRepository, B: CacheBackend> {
    repo: Arc<R>,
    cache: CacheGateway<B>,
    duplicates: DuplicateChecker<R>,
    cfg: TeamMemberConfig,
}

impl<R: TeamMemberRepository, B: CacheBackend> TeamMemberService<R, B> {
    pub fn new(repo: Arc<R>, cache: CacheGateway<B>, cfg: TeamMemberConfig) -> Self {
        let duplicates = DuplicateChecker::new(Arc::clone(&repo));
        Self { repo, cache, duplicates, cfg }
    }

    /// Register a new team member.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use service::team_member::{CacheGateway, CreateRequest, TeamMemberConfig, TeamMemberService};
    /// use service::team_member::cache::mock::MockCacheBackend;
    /// use service::team_member::repository::mock::MockTeamMemberRepository;
    /// let cache = CacheGateway::new(Arc::new(MockCacheBackend::default()), Duration::from_secs(300));
    /// let svc = TeamMemberService::new(Arc::new(MockTeamMemberRepository::default()), cache, TeamMemberConfig::default());
    /// let req = CreateRequest { name: "A".into(), username: "U1".into(), email: "a@x.com".into() };
    /// let member = tokio_test::block_on(svc.create(req)).unwrap();
    /// assert_eq!(member.id, 1);
    /// assert_eq!(member.username, "u1");
    /// ```
    #[instrument(skip(self, req), fields(email = %req.email, username = %req.username))]
    pub async fn create(&self, req: CreateRequest) -> Result<TeamMember, TeamMemberError> {
        let req = req.normalized();
        req.validate()?;
        self.duplicates.check(&req.email, &req.username, 0).await?;

        let created = self
            .repo
            .insert(TeamMember::new(req.name, req.username, req.email))
            .await
            .map_err(|e| {
                error!(op = "team_member.create", error = %e, "failed create db");
                TeamMemberError::Store("creating team member")
            })?;
        info!(id = created.id, "team_member_created");
        Ok(created)
    }

    /// Cache-aside single-record read.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: u64) -> Result<TeamMember, TeamMemberError> {
        let key = detail_cache_key(id);
        if let Some(cached) = self.cache.get::<TeamMember>(&key).await {
            // a zero id means the payload decoded to nothing useful
            if cached.exists() {
                debug!(id, "cache hit");
                return Ok(cached);
            }
        }

        let found = self.repo.find_one(&DetailQuery::by_id(id)).await.map_err(|e| {
            error!(op = "team_member.get_by_id", error = %e, "failed get detail");
            TeamMemberError::Store("reading team member")
        })?;
        let member = found.filter(TeamMember::exists).ok_or(TeamMemberError::NotFound)?;

        self.spawn_populate(key, member.clone());
        Ok(member)
    }

    /// Replace name, username and email of an existing member.
    #[instrument(skip(self, req), fields(id = req.id))]
    pub async fn update(&self, req: UpdateRequest) -> Result<(), TeamMemberError> {
        let req = req.normalized();
        req.validate()?;
        self.get_by_id(req.id).await?;
        self.duplicates.check(&req.email, &req.username, req.id).await?;

        let member = TeamMember { id: req.id, name: req.name, username: req.username, email: req.email, ..Default::default() };
        self.repo.update(&member).await.map_err(|e| {
            error!(op = "team_member.update", error = %e, "failed update db");
            TeamMemberError::Store("updating team member")
        })?;

        self.spawn_invalidate(req.id);
        info!(id = req.id, "team_member_updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: u64) -> Result<(), TeamMemberError> {
        self.get_by_id(id).await?;
        self.repo.delete(id).await.map_err(|e| {
            error!(op = "team_member.delete", error = %e, "failed delete db");
            TeamMemberError::Store("deleting team member")
        })?;

        self.spawn_invalidate(id);
        info!(id, "team_member_deleted");
        Ok(())
    }

    /// One page plus an approximate total.
    ///
    /// A page shorter than `limit` is the last one and its length is reported
    /// as the total. A full page triggers one id-only scan from the same offset
    /// over `TOTAL_OVERSAMPLE * limit` rows, whose length becomes the total;
    /// larger result sets are undercounted rather than paying for a COUNT.
    #[instrument(skip(self, req), fields(page = req.page, limit = req.limit))]
    pub async fn list(&self, req: ListRequest) -> Result<Paginated<TeamMember>, TeamMemberError> {
        let query = req.validate()?;

        let data = self.repo.find_many(&query).await.map_err(|e| {
            error!(op = "team_member.list", error = %e, "failed get list");
            TeamMemberError::Store("listing team members")
        })?;

        let returned = data.len() as u64;
        let mut page = Paginated { data, meta: PageMeta { page: query.page, limit: query.limit, total_records: returned } };

        // Not exactly one full page: nothing more to count. This also covers
        // `no_limit`, which returns every row at once.
        if returned == 0 || returned != query.limit {
            return Ok(page);
        }

        let total_query = ListQuery {
            projection: Projection::IdOnly,
            skip_defaults: true,
            offset: query.offset,
            limit: query.limit.saturating_mul(TOTAL_OVERSAMPLE),
            ..query
        };
        let ids = self.repo.find_many(&total_query).await.map_err(|e| {
            error!(op = "team_member.list", error = %e, "failed get total data");
            TeamMemberError::Store("counting team members")
        })?;
        page.meta.total_records = ids.len() as u64;
        Ok(page)
    }

    /// Detached from the caller: dropping the request future does not cancel it.
    fn spawn_populate(&self, key: String, member: TeamMember) {
        let cache = self.cache.clone();
        let ttl = self.cfg.detail_ttl;
        tokio::spawn(async move {
            cache.set(&key, &member, ttl).await;
        });
    }

    fn spawn_invalidate(&self, id: u64) {
        let cache = self.cache.clone();
        let key = detail_cache_key(id);
        tokio::spawn(async move {
            cache.delete(&key).await;
        });
    }
}
