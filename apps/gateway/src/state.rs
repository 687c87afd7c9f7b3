//! Application state management.
//!
//! Shared state passed to all request handlers:
//! - Configuration
//! - Payment repository (Postgres-backed)
//! - Broker publisher for republishing webhook events
//! - Per-client rate limiter

use std::sync::Arc;

use amqp_worker::BrokerPublisher;
use domain_payments::PaymentRepository;
use sqlx::PgPool;

use crate::middleware::rate_limit::RateLimiter;

/// Shared application state.
///
/// Cloned for each handler; all members are cheap Arc clones.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// Payment persistence
    pub repository: Arc<dyn PaymentRepository>,
    /// Connection pool, used directly by readiness checks
    pub db: PgPool,
    /// Publishes verified webhook payloads to the fanout exchange
    pub publisher: Arc<BrokerPublisher>,
    /// Per-client request rate limiter
    pub limiter: Arc<RateLimiter>,
}
