use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// One year. Longer TTLs are rejected at startup.
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub fetch_backoff_ms: u64,
    pub rate_limit_api_per_minute: u32,
    pub rate_limit_generate_per_hour: u32,
    /// Key clients by the first `X-Forwarded-For` hop (only behind a trusted proxy).
    pub trust_forwarded_for: bool,
    /// Where generated letters are written. `None` disables persistence.
    pub output_dir: Option<PathBuf>,
    /// Enables enhanced generation when present.
    pub anthropic_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8020,
            rust_log: "info".to_string(),
            cache_ttl_secs: 86_400,
            cache_capacity: 512,
            fetch_timeout_secs: 30,
            fetch_max_retries: 2,
            fetch_backoff_ms: 500,
            rate_limit_api_per_minute: 60,
            rate_limit_generate_per_hour: 10,
            trust_forwarded_for: false,
            output_dir: Some(PathBuf::from("generated_applications")),
            anthropic_api_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        let config = Config {
            port: env_or("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity)?,
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?,
            fetch_max_retries: env_or("FETCH_MAX_RETRIES", defaults.fetch_max_retries)?,
            fetch_backoff_ms: env_or("FETCH_BACKOFF_MS", defaults.fetch_backoff_ms)?,
            rate_limit_api_per_minute: env_or(
                "RATE_LIMIT_API_PER_MINUTE",
                defaults.rate_limit_api_per_minute,
            )?,
            rate_limit_generate_per_hour: env_or(
                "RATE_LIMIT_GENERATE_PER_HOUR",
                defaults.rate_limit_generate_per_hour,
            )?,
            trust_forwarded_for: env_or("TRUST_FORWARDED_FOR", defaults.trust_forwarded_for)?,
            output_dir: match std::env::var("OUTPUT_DIR") {
                Ok(dir) if dir.trim().is_empty() => None,
                Ok(dir) => Some(PathBuf::from(dir)),
                Err(_) => defaults.output_dir,
            },
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Range checks that parsing alone cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            bail!(
                "CACHE_TTL_SECS must be at most {MAX_CACHE_TTL_SECS} (one year), got {}",
                self.cache_ttl_secs
            );
        }
        if self.fetch_timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    /// Page cache TTL, clamped to `MAX_CACHE_TTL_SECS`.
    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = self.cache_ttl_secs.min(MAX_CACHE_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
