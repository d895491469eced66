use core_lib::{
    Cache, Repository, SchedulingApi,
    adapters::{
        http_scheduling_client::HttpSchedulingClient,
        in_memory_cache::InMemoryCache,
        in_memory_repository::InMemoryRepository,
        postgres_repository::{MIGRATOR, PostgresRepository},
    },
};
use dotenvy::dotenv;
use portal::{AppState, config::PortalConfig, create_app};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SESSION_CACHE_CAPACITY: u64 = 10_000;

async fn build_repository(database_url: Option<&str>) -> Result<Arc<dyn Repository>, BoxError> {
    let Some(url) = database_url else {
        warn!("DATABASE_URL not set, data is kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryRepository::default()));
    };

    let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
    info!("Connected to Postgres");

    info!("Applying database migrations...");
    MIGRATOR.run(&pool).await?;
    info!("Migrations applied successfully.");

    Ok(Arc::new(PostgresRepository::new(pool)))
}

async fn run() -> Result<(), BoxError> {
    dotenv().ok();
    let config = PortalConfig::from_env()?;

    let repo = build_repository(config.database_url.as_deref()).await?;
    let scheduling_base_url = config.scheduling_api_url.to_string();
    let scheduling: Arc<dyn SchedulingApi> = Arc::new(HttpSchedulingClient::new(
        config.scheduling_api_url.clone(),
        config.scheduling_timeout,
    )?);
    let sessions: Arc<dyn Cache> = Arc::new(InMemoryCache::new(
        SESSION_CACHE_CAPACITY,
        config.session_ttl_secs,
    ));
    info!("Scheduling service at {}", scheduling_base_url);

    let app = create_app(AppState {
        repo,
        scheduling,
        sessions,
        scheduling_base_url,
    });

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Portal listening on {}", config.bind_addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    info!("Starting portal v{}...", env!("CARGO_PKG_VERSION"));
    if let Err(e) = run().await {
        error!("Portal stopped: {}", e);
        std::process::exit(1);
    }
}
