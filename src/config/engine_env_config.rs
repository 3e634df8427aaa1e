//! Engine tuning knobs: chain order, timeouts, backoff, TTLs, budgets.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    /// Provider order for market data (comma-separated ids)
    pub market_provider_order: Vec<String>,
    /// Provider order for generation (comma-separated ids)
    pub gen_provider_order: Vec<String>,
    /// Lowest-common-denominator market provider
    pub market_default_provider: String,
    /// Default generation provider used when no configured one is ready
    pub gen_default_provider: String,

    pub market_provider_timeout: Duration,
    pub gen_provider_timeout: Duration,

    pub cooldown_base: Duration,
    pub cooldown_max: Duration,

    pub min_samples: usize,
    pub fetch_limit: usize,

    pub fast_cache_capacity: usize,
    pub fast_cache_ttl: Duration,
    pub durable_cache_ttl: Duration,

    pub rotation_bucket: Duration,
    pub market_ladder_deadline: Duration,
    pub gen_overall_budget: Duration,
    pub gen_min_attempt_budget: Duration,

    pub cache_db_url: String,
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{name} must be an integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &str, default: usize) -> Result<usize> {
    Ok(env_u64(name, default as u64)? as usize)
}

fn env_list(name: &str, default: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl EngineEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            market_provider_order: env_list(
                "MARKET_PROVIDER_ORDER",
                "binance,twelvedata,frankfurter",
            ),
            gen_provider_order: env_list("GEN_PROVIDER_ORDER", "openai,groq"),
            market_default_provider: env::var("MARKET_DEFAULT_PROVIDER")
                .unwrap_or_else(|_| "frankfurter".to_string()),
            gen_default_provider: env::var("GEN_DEFAULT_PROVIDER")
                .unwrap_or_else(|_| "openai".to_string()),

            market_provider_timeout: Duration::from_millis(env_u64(
                "MARKET_PROVIDER_TIMEOUT_MS",
                8_000,
            )?),
            gen_provider_timeout: Duration::from_millis(env_u64(
                "GEN_PROVIDER_TIMEOUT_MS",
                20_000,
            )?),

            cooldown_base: Duration::from_secs(env_u64("COOLDOWN_BASE_SECS", 60)?),
            cooldown_max: Duration::from_secs(env_u64("COOLDOWN_MAX_SECS", 1_800)?),

            min_samples: env_usize("MIN_SAMPLES", 30)?,
            fetch_limit: env_usize("FETCH_LIMIT", 200)?,

            fast_cache_capacity: env_usize("FAST_CACHE_CAPACITY", 256)?,
            fast_cache_ttl: Duration::from_secs(env_u64("FAST_CACHE_TTL_SECS", 60)?),
            durable_cache_ttl: Duration::from_secs(env_u64("DURABLE_CACHE_TTL_SECS", 900)?),

            rotation_bucket: Duration::from_secs(env_u64("ROTATION_BUCKET_SECS", 60)?),
            market_ladder_deadline: Duration::from_millis(env_u64(
                "MARKET_LADDER_DEADLINE_MS",
                30_000,
            )?),
            gen_overall_budget: Duration::from_millis(env_u64("GEN_OVERALL_BUDGET_MS", 45_000)?),
            gen_min_attempt_budget: Duration::from_millis(env_u64(
                "GEN_MIN_ATTEMPT_BUDGET_MS",
                750,
            )?),

            cache_db_url: env::var("CACHE_DB_URL")
                .unwrap_or_else(|_| "sqlite://data/cache.db".to_string()),
        })
    }
}
