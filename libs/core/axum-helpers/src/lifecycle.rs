//! Ordered shutdown steps with per-step timeouts.
//!
//! Subsystems stop in registration order, outermost first, so nothing is torn
//! down while something in front of it still needs it. Every step runs even
//! when an earlier one fails; all failures are collected and reported together.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

type StepFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

struct LifecycleStep {
    name: &'static str,
    timeout: Duration,
    run: StepFuture,
}

/// One or more shutdown steps failed or timed out.
#[derive(Debug, Error)]
#[error("shutdown finished with errors: {}", failures.join("; "))]
pub struct LifecycleError {
    pub failures: Vec<String>,
}

/// Ordered graceful-shutdown runner.
///
/// # Example
/// ```ignore
/// let mut lifecycle = Lifecycle::new();
/// lifecycle.step("http", Duration::from_secs(10), async move {
///     http_handle.shutdown().await
/// });
/// lifecycle.step("pool", Duration::from_secs(30), async move {
///     pool.shutdown().await
/// });
/// lifecycle.run().await?;
/// ```
pub struct Lifecycle {
    steps: Vec<LifecycleStep>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Register a shutdown step. Steps run in registration order.
    pub fn step<F, E>(&mut self, name: &'static str, timeout: Duration, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display,
    {
        self.steps.push(LifecycleStep {
            name,
            timeout,
            run: Box::pin(async move { fut.await.map_err(|e| e.to_string()) }),
        });
    }

    /// Run every step in order, continuing past failures.
    ///
    /// Returns the collected failures, if any.
    pub async fn run(self) -> Result<(), LifecycleError> {
        let mut failures = Vec::new();

        for step in self.steps {
            info!(step = step.name, "shutting down");
            match tokio::time::timeout(step.timeout, step.run).await {
                Ok(Ok(())) => info!(step = step.name, "stopped"),
                Ok(Err(message)) => {
                    error!(step = step.name, error = %message, "shutdown step failed");
                    failures.push(format!("{}: {}", step.name, message));
                }
                Err(_) => {
                    warn!(step = step.name, timeout_s = step.timeout.as_secs(), "shutdown step timed out");
                    failures.push(format!("{}: timed out", step.name));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError { failures })
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut lifecycle = Lifecycle::new();

        for name in ["http", "grpc", "pool"] {
            let order = Arc::clone(&order);
            lifecycle.step(name, Duration::from_secs(1), async move {
                order.lock().unwrap().push(name);
                Ok::<(), String>(())
            });
        }

        lifecycle.run().await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["http", "grpc", "pool"]);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_steps() {
        let ran = Arc::new(AtomicUsize::new(0));
        let mut lifecycle = Lifecycle::new();

        lifecycle.step("broken", Duration::from_secs(1), async {
            Err::<(), String>("boom".to_string())
        });
        {
            let ran = Arc::clone(&ran);
            lifecycle.step("after", Duration::from_secs(1), async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            });
        }

        let err = lifecycle.run().await.unwrap_err();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(err.failures, vec!["broken: boom".to_string()]);
    }

    #[tokio::test]
    async fn test_slow_step_times_out() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.step("stuck", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), String>(())
        });

        let err = lifecycle.run().await.unwrap_err();
        assert_eq!(err.failures, vec!["stuck: timed out".to_string()]);
    }
}
