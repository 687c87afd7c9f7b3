//! The message processor contract.
//!
//! Decoding and domain handling of a consumed event live behind this trait;
//! the consumer infrastructure only cares whether processing succeeded.

use async_trait::async_trait;
use thiserror::Error;

/// Content-level processing failure.
///
/// Distinct from [`crate::WorkerError`]: a processing failure is local to a
/// single delivery. The delivery is negatively acknowledged without requeue
/// and the worker moves on; the infrastructure retry counter is untouched.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessingError {
    message: String,
}

impl ProcessingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Processor invoked for every consumed delivery.
///
/// Implementations are called concurrently from all workers and must not
/// assume shared mutable state. They should not block indefinitely; the
/// only timeout imposed by the infrastructure is worker-level cancellation.
///
/// # Example
///
/// ```rust,ignore
/// struct PaymentEventProcessor { repository: Arc<dyn PaymentRepository> }
///
/// #[async_trait]
/// impl EventProcessor for PaymentEventProcessor {
///     async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError> {
///         let event = decode(payload)?;
///         self.repository.apply(event).await
///     }
///
///     fn name(&self) -> &'static str {
///         "PaymentEventProcessor"
///     }
/// }
/// ```
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Process a single delivery payload.
    ///
    /// `Ok(())` acknowledges the delivery; `Err` drops it without requeue.
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError>;

    /// Processor name for logging and metric labels.
    fn name(&self) -> &'static str;
}
