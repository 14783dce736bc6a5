use std::process::ExitCode;
use std::sync::Arc;

use dotenvy::dotenv;
use migration::MigratorTrait;
use tracing::{error, info};

use service::team_member::{
    CacheGateway, ListRequest, MokaCacheBackend, SeaOrmTeamMemberRepository, TeamMemberConfig, TeamMemberService,
};

async fn run(cfg: configs::AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    if models::team_member::seed_defaults(&db).await? {
        info!(event = "seeded", "inserted default team member");
    }

    let repo = Arc::new(SeaOrmTeamMemberRepository::new(db));
    let backend = Arc::new(MokaCacheBackend::from_config(&cfg.cache));
    let cache = CacheGateway::from_config(backend, &cfg.cache);
    let svc = TeamMemberService::new(repo, cache, TeamMemberConfig::from(&cfg.cache));

    let page = svc.list(ListRequest::default()).await?;
    info!(
        event = "ready",
        page = page.meta.page,
        limit = page.meta.limit,
        total_records = page.meta.total_records,
        "team member service ready"
    );
    if let Some(first) = page.data.first() {
        let member = svc.get_by_id(first.id).await?;
        info!(id = member.id, username = %member.username, "first team member loaded");
    }
    Ok(())
}

fn main() -> ExitCode {
    // .env first so RUST_LOG and DATABASE_URL are visible
    dotenv().ok();

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "roster", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(cfg.logging.json);
    info!(service = "roster", version = env!("CARGO_PKG_VERSION"), pid = std::process::id(), "starting");

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "roster", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "roster", event = "fatal", error = %e, "roster exited with error");
            ExitCode::FAILURE
        }
    }
}
