use anyhow::Context as _;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, migrate::Migrator};

use crate::cache::CacheService;

/// Schema for profiles and the badge/challenge catalogs.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Postgres pool plus the catalog cache, cloned into every store handle.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    cache: CacheService,
}

impl Database {
    /// Open a pool against `url` and pair it with `cache`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        cache: CacheService,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .context("failed to connect to PostgreSQL")?;

        Ok(Self::with_cache(pool, cache))
    }

    pub fn with_cache(pool: PgPool, cache: CacheService) -> Self {
        Self { pool, cache }
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .context("failed to apply database migrations")
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }
}
