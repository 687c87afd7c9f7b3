//! Fixed-size worker pool with fail-fast supervision.
//!
//! Every worker owns its own delivery source and backoff controller; the pool
//! owns the shared cancellation signal and the first terminal error. When one
//! worker fails terminally the pool cancels its siblings, and the first error
//! recorded wins the aggregation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::consumer::{run_consumer, ConsumerExit};
use crate::error::WorkerError;
use crate::metrics;
use crate::processor::EventProcessor;
use crate::retry::{BackoffController, RetryDecision, RetryPolicy};
use crate::source::SourceConnector;

/// Pool sizing and retry settings.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub worker_count: usize,
    pub retry: RetryPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            retry: RetryPolicy::default(),
        }
    }
}

/// Pool lifecycle state. Transitions are monotonic:
/// `Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Running,
    Draining,
    Stopped,
}

/// Terminal pool error: which worker failed first and why.
///
/// Carries the rendered message rather than the source error so the result
/// can be returned from repeated `shutdown` calls.
#[derive(Debug, Clone, thiserror::Error)]
#[error("worker {worker_id} failed: {message}")]
pub struct PoolError {
    pub worker_id: usize,
    pub message: String,
}

impl PoolError {
    fn from_worker(worker_id: usize, err: &WorkerError) -> Self {
        Self {
            worker_id,
            message: err.to_string(),
        }
    }
}

struct PoolShared {
    shutdown_tx: watch::Sender<bool>,
    first_error: Mutex<Option<PoolError>>,
    fatal_flag: AtomicBool,
    fatal_notify: Notify,
    state: Mutex<PoolState>,
}

impl PoolShared {
    fn begin_drain(&self) {
        let mut state = self.state.lock().expect("pool state lock poisoned");
        if *state == PoolState::Running {
            *state = PoolState::Draining;
        }
        drop(state);
        // send_replace stores the value even while no worker has subscribed
        // yet, so a late subscriber still observes the cancellation
        self.shutdown_tx.send_replace(true);
    }

    /// Record a terminal worker error. The first recorded error wins; every
    /// call triggers draining so siblings stop promptly.
    fn record_fatal(&self, err: PoolError) {
        {
            let mut first = self.first_error.lock().expect("pool error lock poisoned");
            if first.is_none() {
                *first = Some(err);
            }
        }
        self.begin_drain();
        self.fatal_flag.store(true, Ordering::Release);
        self.fatal_notify.notify_waiters();
    }

    fn first_error(&self) -> Option<PoolError> {
        self.first_error
            .lock()
            .expect("pool error lock poisoned")
            .clone()
    }
}

struct PoolInner {
    tasks: JoinSet<Result<(), PoolError>>,
    result: Option<Result<(), PoolError>>,
}

/// Concurrent consumer pool.
///
/// Started with [`WorkerPool::start`]; stopped with [`WorkerPool::shutdown`],
/// which is idempotent and returns the same result on every call.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    inner: tokio::sync::Mutex<PoolInner>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers consuming through `connector`.
    ///
    /// Worker ids are 1-based; the broker source uses them for consumer tags.
    pub fn start(
        connector: Arc<dyn SourceConnector>,
        processor: Arc<dyn EventProcessor>,
        config: PoolConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let shared = Arc::new(PoolShared {
            shutdown_tx,
            first_error: Mutex::new(None),
            fatal_flag: AtomicBool::new(false),
            fatal_notify: Notify::new(),
            state: Mutex::new(PoolState::Running),
        });

        let mut tasks = JoinSet::new();
        for worker_id in 1..=config.worker_count {
            tasks.spawn(run_worker(
                worker_id,
                Arc::clone(&connector),
                Arc::clone(&processor),
                config.retry.clone(),
                Arc::clone(&shared),
            ));
        }

        metrics::set_active_workers(config.worker_count);
        info!(
            workers = config.worker_count,
            processor = processor.name(),
            "worker pool started"
        );

        Self {
            shared,
            inner: tokio::sync::Mutex::new(PoolInner {
                tasks,
                result: None,
            }),
        }
    }

    pub fn state(&self) -> PoolState {
        *self.shared.state.lock().expect("pool state lock poisoned")
    }

    /// Resolve once any worker records a terminal error.
    ///
    /// Used by the application's lifecycle loop to shut the whole process
    /// down when the pool fails.
    pub async fn fatal_error(&self) -> PoolError {
        loop {
            let notified = self.shared.fatal_notify.notified();
            if self.shared.fatal_flag.load(Ordering::Acquire) {
                if let Some(err) = self.shared.first_error() {
                    return err;
                }
            }
            notified.await;
        }
    }

    /// Signal cancellation and wait for every worker to finish.
    ///
    /// Returns `Ok(())` if all workers stopped cleanly, or the first terminal
    /// error otherwise. Safe to call more than once: concurrent calls
    /// serialize, and later calls return the recorded result.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        let mut inner = self.inner.lock().await;
        if let Some(result) = &inner.result {
            return result.clone();
        }

        self.shared.begin_drain();

        while let Some(joined) = inner.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                // Terminal worker errors were already recorded fail-fast
                Ok(Err(_)) => {}
                Err(join_err) => {
                    error!(error = %join_err, "worker task panicked");
                    self.shared.record_fatal(PoolError {
                        worker_id: 0,
                        message: format!("worker task panicked: {join_err}"),
                    });
                }
            }
        }

        let result = match self.shared.first_error() {
            Some(err) => Err(err),
            None => Ok(()),
        };

        *self.shared.state.lock().expect("pool state lock poisoned") = PoolState::Stopped;
        metrics::set_active_workers(0);
        info!("worker pool stopped");

        inner.result = Some(result.clone());
        result
    }
}

async fn run_worker(
    worker_id: usize,
    connector: Arc<dyn SourceConnector>,
    processor: Arc<dyn EventProcessor>,
    policy: RetryPolicy,
    shared: Arc<PoolShared>,
) -> Result<(), PoolError> {
    match worker_loop(worker_id, connector, processor, policy, &shared).await {
        Ok(()) => {
            info!(worker_id, "worker stopped");
            Ok(())
        }
        Err(err) => {
            error!(worker_id, error = %err, "worker failed terminally");
            metrics::record_worker_failed(worker_id);
            let pool_err = PoolError::from_worker(worker_id, &err);
            shared.record_fatal(pool_err.clone());
            Err(pool_err)
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    connector: Arc<dyn SourceConnector>,
    processor: Arc<dyn EventProcessor>,
    policy: RetryPolicy,
    shared: &PoolShared,
) -> Result<(), WorkerError> {
    let mut shutdown = shared.shutdown_tx.subscribe();
    let mut backoff = BackoffController::new(policy);

    loop {
        if *shutdown.borrow_and_update() {
            backoff.stop();
            return Ok(());
        }

        let failure = match consume_cycle(
            worker_id,
            connector.as_ref(),
            &processor,
            &mut backoff,
            &mut shutdown,
        )
        .await
        {
            Ok(ConsumerExit::Cancelled) => {
                backoff.stop();
                return Ok(());
            }
            // A cleanly closed source ends this worker without error; the
            // rest of the pool keeps consuming
            Ok(ConsumerExit::Closed) => {
                info!(worker_id, "delivery source closed");
                backoff.stop();
                return Ok(());
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => err,
        };

        match backoff.record_failure() {
            RetryDecision::Backoff(delay) => {
                warn!(
                    worker_id,
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "recoverable failure, backing off"
                );
                metrics::record_retry(worker_id);

                tokio::select! {
                    biased;

                    _ = shutdown.changed() => {
                        backoff.stop();
                        return Ok(());
                    }
                    _ = tokio::time::sleep(delay) => backoff.resume(),
                }
            }
            RetryDecision::GiveUp => {
                return Err(backoff.exhausted(worker_id, failure));
            }
        }
    }
}

/// One connect-and-consume cycle.
async fn consume_cycle(
    worker_id: usize,
    connector: &dyn SourceConnector,
    processor: &Arc<dyn EventProcessor>,
    backoff: &mut BackoffController,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<ConsumerExit, WorkerError> {
    let mut source = connector.connect(worker_id).await?;
    run_consumer(worker_id, &mut source, processor, backoff, shutdown).await
}
