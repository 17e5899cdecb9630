mod commands;
mod config;
mod console;

use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use quizpop_database::{CacheService, Database, GameStore, MemoryStore};
use quizpop_progression::ProgressionService;

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(|metadata| {
            let within_info_level = *metadata.level() <= tracing::Level::INFO;
            within_info_level && !metadata.target().starts_with("sqlx::query")
        }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    info!(
        regen_unit_secs = config.engine.regen_unit_secs(),
        regen_poll_secs = config.engine.regen_poll.as_secs(),
        regen_policy = ?config.engine.regen_policy,
        refill_price = config.engine.refill_price,
        points_per_answer = config.engine.points_per_answer,
        "Progression engine configured."
    );

    let store = connect_store(&config).await?;

    let mut service = ProgressionService::new(store, config.engine);
    if !service.sign_in(config.user_id.clone()).await? {
        info!("No QUIZPOP_USER_ID set; running without a session.");
    }

    let result = console::run(&mut service).await;
    service.shutdown().await;
    info!("QuizPop stopped.");

    result
}

async fn connect_store(config: &AppConfig) -> anyhow::Result<GameStore> {
    let Some(database_url) = &config.database_url else {
        info!("DATABASE_URL not set; using the in-memory store.");
        return Ok(GameStore::memory(MemoryStore::seeded()));
    };

    let cache = build_cache(config).await;
    let db = Database::connect(database_url, config.max_connections, cache).await?;
    info!("PostgreSQL connection established.");

    if config.auto_run_migrations {
        db.run_migrations().await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    Ok(GameStore::postgres(db))
}

async fn build_cache(config: &AppConfig) -> CacheService {
    let prefix = config.redis_key_prefix.clone();

    let cache = if !config.redis_enabled {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        CacheService::disabled(prefix)
    } else if let Some(redis_url) = &config.redis_url {
        match CacheService::redis(redis_url, prefix.clone()) {
            Ok(cache) => {
                info!(key_prefix = %prefix, "Redis cache enabled.");
                cache
            }
            Err(err) => {
                warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                CacheService::disabled(prefix)
            }
        }
    } else {
        warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
        CacheService::disabled(prefix)
    };

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    cache
}
