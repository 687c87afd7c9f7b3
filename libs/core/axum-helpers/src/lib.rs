//! # Axum Helpers
//!
//! Utilities for building Axum web applications:
//!
//! - **[`errors`]**: structured error responses
//! - **[`health`]**: health and readiness check helpers
//! - **[`lifecycle`]**: ordered graceful-shutdown steps with timeouts
//! - **[`shutdown`]**: signal handling and shutdown broadcasting

pub mod errors;
pub mod health;
pub mod lifecycle;
pub mod shutdown;

pub use errors::{AppError, ErrorResponse};
pub use health::{run_health_checks, HealthCheckFuture, HealthResponse};
pub use lifecycle::{Lifecycle, LifecycleError};
pub use shutdown::{shutdown_signal, ShutdownCoordinator};
