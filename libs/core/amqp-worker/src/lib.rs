//! AMQP Worker Pool
//!
//! A RabbitMQ consumer framework: a fixed-size pool of workers, each with its
//! own channel and retry loop, supervised fail-fast and stopped gracefully.
//!
//! ## Features
//!
//! - **Worker pool**: N concurrent consumers, one channel each, prefetch 1
//! - **Retry with backoff**: linear per-worker backoff, bounded attempts
//! - **Fail-fast supervision**: one terminal failure drains the whole pool
//! - **Graceful shutdown**: idempotent, first-error-wins aggregation
//! - **Local queue**: in-process delivery source for offload and tests
//! - **Prometheus metrics**: built-in observability
//!
//! ## Example
//!
//! ```ignore
//! use amqp_worker::{BrokerClient, BrokerConfig, PoolConfig, WorkerPool};
//!
//! let broker = BrokerClient::connect(BrokerConfig::new(amqp_url)).await?;
//! let pool = WorkerPool::start(
//!     Arc::new(broker.connector()),
//!     Arc::new(MyProcessor::new()),
//!     PoolConfig::default(),
//! );
//!
//! tokio::select! {
//!     err = pool.fatal_error() => tracing::error!(%err, "pool failed"),
//!     _ = shutdown_signal() => {}
//! }
//! pool.shutdown().await?;
//! ```

mod broker;
mod consumer;
mod error;
pub mod metrics;
mod pool;
mod processor;
mod retry;
mod source;

// Re-export main types
pub use broker::{BrokerClient, BrokerConfig, BrokerConnector, BrokerPublisher};
pub use error::{Recoverability, WorkerError};
pub use metrics::{init_metrics, render_metrics};
pub use pool::{PoolConfig, PoolError, PoolState, WorkerPool};
pub use processor::{EventProcessor, ProcessingError};
pub use retry::{BackoffController, BackoffState, RetryDecision, RetryPolicy};
pub use source::{
    AckOutcome, Delivery, DeliverySource, LocalConnector, LocalQueue, NextDelivery,
    SourceConnector,
};
