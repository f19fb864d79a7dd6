//! Fixed-window, per-client rate limiting.
//!
//! Two limiters live in `AppState`: a low-frequency one for generation and a
//! higher-frequency one for the lighter API calls. Rejection happens in
//! middleware, before the request body is read.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Above this many tracked clients, expired windows are pruned on insert.
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    name: &'static str,
    limit: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    /// `limit` requests per `window` per client. A limit of 0 disables the limiter.
    pub fn new(name: &'static str, limit: u32, window: Duration) -> Self {
        Self {
            name,
            limit,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    /// Counts one request for `key` at `now`. On rejection returns the
    /// seconds until the client's window resets (at least 1).
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.limit == 0 {
            return Ok(());
        }

        let mut clients = self.clients.lock().unwrap_or_else(|p| p.into_inner());

        if !clients.contains_key(key) && clients.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started_at) < window);
        }

        let entry = clients.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if now.duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }

        if entry.count < self.limit {
            entry.count += 1;
            return Ok(());
        }

        let remaining = self
            .window
            .saturating_sub(now.duration_since(entry.started_at));
        Err(remaining.as_secs_f64().ceil().max(1.0) as u64)
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// Rate-limit key for a request: the first `X-Forwarded-For` hop when the
/// proxy is trusted, else the peer IP.
pub fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return hop.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn enforce(limiter: &RateLimiter, state: &AppState, request: &Request) -> Result<(), AppError> {
    let key = client_key(request, state.config.trust_forwarded_for);
    limiter.check(&key).map_err(|retry_after_secs| {
        warn!(
            "Rate limit '{}' exceeded for {key} on {}",
            limiter.name,
            request.uri().path()
        );
        AppError::RateLimited { retry_after_secs }
    })
}

pub async fn limit_generation(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state.generation_limiter, &state, &request)?;
    Ok(next.run(request).await)
}

pub async fn limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state.api_limiter, &state, &request)?;
    Ok(next.run(request).await)
}
