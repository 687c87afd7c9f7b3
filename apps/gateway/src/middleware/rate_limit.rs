//! Per-client request rate limiting.
//!
//! Token bucket per client IP, kept in a bounded map behind a single lock.
//! Idle entries are evicted by a scheduled sweep task rather than inline on
//! the request path, and the map never grows past `max_clients`: when full,
//! the stalest entry makes room for the newcomer.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use axum_helpers::AppError;
use core_config::limits::RateLimitConfig;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::state::AppState;

struct ClientState {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Mutex<HashMap<String, ClientState>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether `client` may proceed, consuming a token if so.
    pub fn allow(&self, client: &str) -> bool {
        if !self.config.enabled {
            return true;
        }

        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter lock poisoned");

        if !clients.contains_key(client) && clients.len() >= self.config.max_clients {
            evict_stalest(&mut clients);
        }

        let entry = clients.entry(client.to_string()).or_insert(ClientState {
            tokens: self.config.burst as f64,
            last_refill: now,
            last_seen: now,
        });

        // Refill proportionally to elapsed time, capped at burst
        let elapsed = now.duration_since(entry.last_refill).as_secs_f64();
        entry.tokens =
            (entry.tokens + elapsed * self.config.rps as f64).min(self.config.burst as f64);
        entry.last_refill = now;
        entry.last_seen = now;

        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop entries idle longer than the configured TTL.
    pub fn sweep(&self) {
        let ttl = Duration::from_secs(self.config.idle_ttl_secs);
        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter lock poisoned");
        let before = clients.len();
        clients.retain(|_, state| now.duration_since(state.last_seen) < ttl);
        let evicted = before - clients.len();
        if evicted > 0 {
            debug!(evicted, remaining = clients.len(), "rate limiter sweep");
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

fn evict_stalest(clients: &mut HashMap<String, ClientState>) {
    if let Some(stalest) = clients
        .iter()
        .min_by_key(|(_, state)| state.last_seen)
        .map(|(ip, _)| ip.clone())
    {
        clients.remove(&stalest);
    }
}

/// Periodically sweep idle clients until shutdown.
pub fn spawn_sweeper(
    limiter: std::sync::Arc<RateLimiter>,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => limiter.sweep(),
                _ = shutdown.recv() => {
                    info!("rate limiter sweeper stopping");
                    return;
                }
            }
        }
    })
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Trust the nearest proxy's forwarded address when present
    let client = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    if !state.limiter.allow(&client) {
        return Err(AppError::TooManyRequests(
            "rate limit exceeded".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
