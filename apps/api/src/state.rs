use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::fetcher::cache::PageCache;
use crate::fetcher::{Fetcher, HttpPageSource, PageSource};
use crate::retry::RetryPolicy;
use crate::generation::enhance::LetterPolisher;
use crate::llm_client::{self, LlmClient};
use crate::routes::rate_limit::RateLimiter;
use crate::store::ApplicationStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the page cache; shared by every in-flight request.
    pub fetcher: Arc<Fetcher>,
    pub generation_limiter: Arc<RateLimiter>,
    pub api_limiter: Arc<RateLimiter>,
    /// Present when `ANTHROPIC_API_KEY` is set.
    pub polisher: Option<Arc<dyn LetterPolisher>>,
    /// Present unless `OUTPUT_DIR` is empty.
    pub store: Option<ApplicationStore>,
}

impl AppState {
    /// Builds state around an explicit page source and polisher.
    pub fn new(
        config: Config,
        source: Arc<dyn PageSource>,
        polisher: Option<Arc<dyn LetterPolisher>>,
    ) -> Self {
        let cache = PageCache::new(config.cache_ttl(), config.cache_capacity);
        let retry = RetryPolicy {
            max_retries: config.fetch_max_retries,
            base_backoff: Duration::from_millis(config.fetch_backoff_ms),
        };

        Self {
            fetcher: Arc::new(Fetcher::new(source, cache, retry)),
            generation_limiter: Arc::new(RateLimiter::new(
                "generate",
                config.rate_limit_generate_per_hour,
                Duration::from_secs(3600),
            )),
            api_limiter: Arc::new(RateLimiter::new(
                "api",
                config.rate_limit_api_per_minute,
                Duration::from_secs(60),
            )),
            polisher,
            store: config.output_dir.clone().map(ApplicationStore::new),
            config,
        }
    }

    /// Production wiring: real HTTP fetches and, with a key, LLM polishing.
    pub fn from_config(config: Config) -> Result<Self> {
        let source = HttpPageSource::new(Duration::from_secs(config.fetch_timeout_secs))
            .context("Failed to build HTTP client for page fetches")?;

        let polisher: Option<Arc<dyn LetterPolisher>> = match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone()).context("Failed to build LLM client")?;
                info!("Enhanced generation enabled (model: {})", llm_client::MODEL);
                Some(Arc::new(llm))
            }
            None => {
                info!("ANTHROPIC_API_KEY not set, using template-only generation");
                None
            }
        };

        Ok(Self::new(config, Arc::new(source), polisher))
    }
}
