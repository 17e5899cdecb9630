use std::env;
use std::time::Duration;

use tracing::warn;

use quizpop_core::lives::RegenPolicy;
use quizpop_core::{EngineConfig, UserId};
use quizpop_utils::parse::{parse_duration, parse_flag};

pub const DEFAULT_REDIS_KEY_PREFIX: &str = "quizpop:prod";
pub const DEFAULT_MAX_CONNECTIONS: u64 = 5;

/// Process configuration read from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub auto_run_migrations: bool,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub user_id: Option<UserId>,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let max_connections = env_u64("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);

        Self {
            database_url: env_string("DATABASE_URL"),
            max_connections: u32::try_from(max_connections).unwrap_or(u32::MAX).max(1),
            auto_run_migrations: env_bool("AUTO_RUN_MIGRATIONS", true),
            redis_enabled: env_bool("REDIS_ENABLED", false),
            redis_url: env_string("REDIS_URL"),
            redis_key_prefix: env_string("REDIS_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_REDIS_KEY_PREFIX.to_string()),
            user_id: env_string("QUIZPOP_USER_ID").and_then(|raw| UserId::parse(&raw)),
            engine: engine_from_env(),
        }
    }
}

fn engine_from_env() -> EngineConfig {
    let defaults = EngineConfig::default();

    let regen_policy = match env_string("QUIZPOP_REGEN_POLICY") {
        Some(raw) => RegenPolicy::parse(&raw).unwrap_or_else(|| {
            warn!(value = %raw, "unknown QUIZPOP_REGEN_POLICY; using carry-over");
            defaults.regen_policy
        }),
        None => defaults.regen_policy,
    };

    EngineConfig {
        regen_unit: env_duration("QUIZPOP_REGEN_UNIT", defaults.regen_unit),
        regen_poll: env_duration("QUIZPOP_REGEN_POLL", defaults.regen_poll),
        regen_policy,
        refill_price: env_u32("QUIZPOP_REFILL_PRICE", defaults.refill_price),
        points_per_answer: env_u32("QUIZPOP_POINTS_PER_ANSWER", defaults.points_per_answer),
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_flag(&value),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    u32::try_from(env_u64(key, u64::from(default))).unwrap_or(default)
}

fn env_duration(key: &str, default: Duration) -> Duration {
    match env::var(key) {
        Ok(value) => parse_duration(&value)
            .filter(|duration| !duration.is_zero())
            .unwrap_or_else(|| {
                warn!(key, value = %value, "invalid duration; using default");
                default
            }),
        Err(_) => default,
    }
}
