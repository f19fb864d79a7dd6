//! Fetcher: retrieves job-posting HTML with caching and bounded retries.
//!
//! The network sits behind the `PageSource` trait so the retry and cache
//! policy can be exercised without sockets. `HttpPageSource` is the only
//! production implementation.

pub mod cache;
pub mod url;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use self::cache::PageCache;
pub use self::url::normalize_url;
use crate::retry::{FailureKind, GaveUp, RetryPolicy, Retryable};
use ::url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("{url} did not respond in time after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("{url}: {message}")]
    Upstream { url: String, message: String },
}

/// One failed attempt as reported by a `PageSource`.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub kind: FailureKind,
    pub timed_out: bool,
    pub message: String,
}

impl SourceFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            timed_out: false,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            timed_out: false,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            timed_out: true,
            message: message.into(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Retryable for SourceFailure {
    fn kind(&self) -> FailureKind {
        self.kind
    }
}

/// Retrieves the raw body of a page. One call is one attempt.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String, SourceFailure>;
}

/// `PageSource` over a real HTTP client.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &Url) -> Result<String, SourceFailure> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response.text().await.map_err(classify_transport_error)
    }
}

/// 429 and 5xx are worth another attempt; any other non-success is final.
pub fn classify_status(status: StatusCode) -> SourceFailure {
    let message = format!("HTTP {status}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        SourceFailure::transient(message)
    } else {
        SourceFailure::permanent(message)
    }
}

fn classify_transport_error(err: reqwest::Error) -> SourceFailure {
    if err.is_timeout() {
        return SourceFailure::timeout(err.to_string());
    }
    if is_dns_failure(&err) {
        return SourceFailure::permanent(format!("DNS resolution failed: {err}"));
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return SourceFailure::transient(err.to_string());
    }
    SourceFailure::permanent(err.to_string())
}

fn is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// A fetched page body and where it came from.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub html: Arc<str>,
    pub from_cache: bool,
}

pub struct Fetcher {
    source: Arc<dyn PageSource>,
    cache: PageCache,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(source: Arc<dyn PageSource>, cache: PageCache, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache,
            retry,
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub async fn fetch(&self, raw_url: &str) -> Result<FetchedPage, FetchError> {
        self.fetch_at(raw_url, Utc::now()).await
    }

    /// Validates `raw_url`, serves a live cache entry if one exists, otherwise
    /// fetches with retries and caches the body as of `now`.
    pub async fn fetch_at(
        &self,
        raw_url: &str,
        now: DateTime<Utc>,
    ) -> Result<FetchedPage, FetchError> {
        let url = normalize_url(raw_url).map_err(FetchError::InvalidUrl)?;
        let key = url.as_str().to_string();

        if let Some(html) = self.cache.get_at(&key, now) {
            debug!("Page cache hit for {key}");
            return Ok(FetchedPage {
                url,
                html,
                from_cache: true,
            });
        }
        debug!("Page cache miss for {key}");

        let source = &self.source;
        let target = &url;
        let outcome = self
            .retry
            .run(&format!("Fetch {key}"), move || source.get(target))
            .await;

        match outcome {
            Ok(body) => {
                let html: Arc<str> = Arc::from(body);
                self.cache.insert_at(key.clone(), Arc::clone(&html), now);
                info!("Fetched {key} ({} bytes)", html.len());
                Ok(FetchedPage {
                    url,
                    html,
                    from_cache: false,
                })
            }
            Err(GaveUp { error, .. }) if error.kind == FailureKind::Permanent => {
                warn!("Permanent fetch failure for {key}: {}", error.message);
                Err(FetchError::Upstream {
                    url: key,
                    message: error.message,
                })
            }
            Err(GaveUp { error, attempts }) if error.timed_out => {
                Err(FetchError::Timeout { url: key, attempts })
            }
            Err(GaveUp { error, attempts }) => Err(FetchError::Upstream {
                url: key,
                message: format!("{} (gave up after {attempts} attempts)", error.message),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{serve_canned, Canned, ScriptedSource};
    use super::*;
    use chrono::TimeZone;

    const URL: &str = "https://jobs.example.com/posting/1";

    fn fetcher_with(source: Arc<ScriptedSource>, max_retries: u32) -> Fetcher {
        Fetcher::new(
            source,
            PageCache::new(chrono::Duration::seconds(86_400), 16),
            RetryPolicy {
                max_retries,
                base_backoff: Duration::from_millis(500),
            },
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_without_network_call() {
        let source = Arc::new(ScriptedSource::always("<html></html>"));
        let fetcher = fetcher_with(source.clone(), 2);

        let err = fetcher.fetch("ftp://jobs.example.com/1").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_served_before_ttl_and_refreshed_after() {
        let source = Arc::new(ScriptedSource::always("<h1>Engineer</h1>"));
        let fetcher = fetcher_with(source.clone(), 0);

        let first = fetcher.fetch_at(URL, t0()).await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(source.calls(), 1);

        let cached = fetcher
            .fetch_at(URL, t0() + chrono::Duration::seconds(86_399))
            .await
            .unwrap();
        assert!(cached.from_cache);
        assert_eq!(source.calls(), 1, "live entry must not touch the network");

        let refreshed = fetcher
            .fetch_at(URL, t0() + chrono::Duration::seconds(86_401))
            .await
            .unwrap();
        assert!(!refreshed.from_cache);
        assert_eq!(source.calls(), 2, "expired entry must trigger a fresh fetch");
    }

    #[tokio::test]
    async fn test_cache_key_is_normalized_url() {
        let source = Arc::new(ScriptedSource::always("<html></html>"));
        let fetcher = fetcher_with(source.clone(), 0);

        fetcher.fetch_at(URL, t0()).await.unwrap();
        let again = fetcher
            .fetch_at("https://JOBS.example.com/posting/1#apply", t0())
            .await
            .unwrap();
        assert!(again.from_cache);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(SourceFailure::transient("HTTP 503 Service Unavailable")),
            Err(SourceFailure::transient("connection reset")),
            Ok("<h1>Engineer</h1>".to_string()),
        ]));
        let fetcher = fetcher_with(source.clone(), 2);

        let page = fetcher.fetch_at(URL, t0()).await.unwrap();
        assert_eq!(&*page.html, "<h1>Engineer</h1>");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceFailure::permanent(
            "HTTP 404 Not Found",
        ))]));
        let fetcher = fetcher_with(source.clone(), 3);

        let err = fetcher.fetch_at(URL, t0()).await.unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_timeouts_surface_as_timeout() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceFailure::timeout(
            "operation timed out",
        ))]));
        let fetcher = fetcher_with(source.clone(), 2);

        let err = fetcher.fetch_at(URL, t0()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { attempts: 3, .. }));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_server_errors_surface_as_upstream() {
        let source = Arc::new(ScriptedSource::new(vec![Err(SourceFailure::transient(
            "HTTP 502 Bad Gateway",
        ))]));
        let fetcher = fetcher_with(source.clone(), 1);

        let err = fetcher.fetch_at(URL, t0()).await.unwrap_err();
        match err {
            FetchError::Upstream { message, .. } => assert!(message.contains("502")),
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(fetcher.cache().len(), 0, "failures must not be cached");
    }

    fn http_source(timeout: Duration) -> HttpPageSource {
        HttpPageSource::new(timeout).unwrap()
    }

    fn local_url(addr: std::net::SocketAddr) -> Url {
        Url::parse(&format!("http://{addr}/posting/1")).unwrap()
    }

    #[tokio::test]
    async fn test_http_source_returns_body() {
        let addr = serve_canned(vec![Canned::new(200, "<h1>Engineer</h1>")]).await;
        let body = http_source(Duration::from_secs(5))
            .get(&local_url(addr))
            .await
            .unwrap();
        assert_eq!(body, "<h1>Engineer</h1>");
    }

    #[tokio::test]
    async fn test_http_source_stall_is_a_timeout() {
        let addr = serve_canned(vec![
            Canned::new(200, "too late").delayed(Duration::from_secs(5))
        ])
        .await;
        let failure = http_source(Duration::from_millis(200))
            .get(&local_url(addr))
            .await
            .unwrap_err();
        assert!(failure.timed_out, "expected a timeout, got {}", failure.message);
        assert_eq!(failure.kind, FailureKind::Transient);
    }

    #[tokio::test]
    async fn test_http_source_server_error_is_transient() {
        let addr = serve_canned(vec![Canned::new(503, "busy")]).await;
        let failure = http_source(Duration::from_secs(5))
            .get(&local_url(addr))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Transient);
        assert!(!failure.timed_out);
        assert!(failure.message.contains("503"));
    }

    #[tokio::test]
    async fn test_http_source_not_found_is_permanent() {
        let addr = serve_canned(vec![Canned::new(404, "gone")]).await;
        let failure = http_source(Duration::from_secs(5))
            .get(&local_url(addr))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Permanent);
    }

    #[tokio::test]
    async fn test_stalled_server_surfaces_as_fetch_timeout() {
        let addr = serve_canned(vec![
            Canned::new(200, "too late").delayed(Duration::from_secs(5))
        ])
        .await;
        let fetcher = Fetcher::new(
            Arc::new(http_source(Duration::from_millis(200))),
            PageCache::new(chrono::Duration::seconds(60), 4),
            RetryPolicy {
                max_retries: 0,
                base_backoff: Duration::from_millis(10),
            },
        );

        let err = fetcher.fetch(local_url(addr).as_str()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { attempts: 1, .. }));
    }

    #[test]
    fn test_dns_failures_are_recognised() {
        let dns = std::io::Error::new(
            std::io::ErrorKind::Other,
            "dns error: failed to lookup address information",
        );
        assert!(is_dns_failure(&dns));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_dns_failure(&refused));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE).kind,
            FailureKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS).kind,
            FailureKind::Transient
        );
        assert_eq!(
            classify_status(StatusCode::NOT_FOUND).kind,
            FailureKind::Permanent
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN).kind,
            FailureKind::Permanent
        );
    }
}
