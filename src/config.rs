use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let database_url = env
            .optional_string("HUMIDIFIER_DATABASE_URL")
            .or_else(|| env.optional_string("DATABASE_URL"))
            .context("HUMIDIFIER_DATABASE_URL (or DATABASE_URL) must be set")?;
        let database_url = normalize_database_url(database_url);

        let db_max_connections = env.u32("HUMIDIFIER_DB_MAX_CONNECTIONS", 10).clamp(1, 100);
        let db_acquire_timeout = Duration::from_secs(
            env.u64("HUMIDIFIER_DB_ACQUIRE_TIMEOUT_SECONDS", 8)
                .clamp(1, 120),
        );
        let cors_origins = env
            .optional_string("HUMIDIFIER_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let rate_limit_per_second = env.u64("HUMIDIFIER_RATE_LIMIT_PER_SECOND", 20).max(1);
        let rate_limit_burst = env.u32("HUMIDIFIER_RATE_LIMIT_BURST", 60).max(1);

        Ok(Self {
            database_url,
            db_max_connections,
            db_acquire_timeout,
            cors_origins,
            rate_limit_per_second,
            rate_limit_burst,
        })
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional_string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn u32(&self, key: &str, default: u32) -> u32 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(default)
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(default)
    }
}

fn normalize_database_url(url: String) -> String {
    if let Some(stripped) = url.strip_prefix("postgresql+psycopg://") {
        return format!("postgresql://{stripped}");
    }
    if let Some(stripped) = url.strip_prefix("postgresql+asyncpg://") {
        return format!("postgresql://{stripped}");
    }
    url
}
