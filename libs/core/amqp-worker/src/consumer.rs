//! The per-worker consume loop.
//!
//! Pulls deliveries from a source, hands payloads to the processor, and
//! settles every delivery exactly once. Infrastructure errors bubble up to
//! the caller for retry classification; content failures are absorbed here.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::WorkerError;
use crate::metrics;
use crate::processor::EventProcessor;
use crate::retry::BackoffController;
use crate::source::{DeliverySource, NextDelivery};

/// Why the consume loop returned without an error.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ConsumerExit {
    /// The source closed cleanly; the worker stops without error
    Closed,
    /// The shared cancellation signal fired
    Cancelled,
}

/// Consume deliveries until the source closes, cancellation fires, or an
/// infrastructure error occurs.
///
/// The shutdown check wins over a ready delivery, so a worker parked on an
/// empty queue reacts to cancellation immediately. A delivery already pulled
/// is always settled before the loop exits.
pub(crate) async fn run_consumer(
    worker_id: usize,
    source: &mut Box<dyn DeliverySource>,
    processor: &Arc<dyn EventProcessor>,
    backoff: &mut BackoffController,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<ConsumerExit, WorkerError> {
    loop {
        let next = tokio::select! {
            biased;

            _ = shutdown.changed() => {
                debug!(worker_id, "shutdown observed, stopping consumer");
                return Ok(ConsumerExit::Cancelled);
            }
            next = source.next_delivery() => next?,
        };

        let delivery = match next {
            NextDelivery::Delivery(delivery) => delivery,
            NextDelivery::Closed => return Ok(ConsumerExit::Closed),
        };

        match processor.process(&delivery.payload).await {
            Ok(()) => {
                delivery.ack().await?;
                // A full consume cycle succeeded, so the retry counter resets
                backoff.record_success();
                metrics::record_processed(processor.name());
            }
            Err(err) => {
                // Content failure: drop the message, keep the worker alive
                warn!(
                    worker_id,
                    processor = processor.name(),
                    error = %err,
                    "processing failed, discarding delivery"
                );
                delivery.nack_discard().await?;
                metrics::record_rejected(processor.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessingError;
    use crate::retry::RetryPolicy;
    use crate::source::{AckOutcome, LocalQueue, SourceConnector};
    use async_trait::async_trait;

    struct FlakyProcessor;

    #[async_trait]
    impl EventProcessor for FlakyProcessor {
        async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError> {
            if payload == b"bad" {
                Err(ProcessingError::new("undecodable payload"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "FlakyProcessor"
        }
    }

    #[tokio::test]
    async fn test_acks_success_and_discards_failures() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();
        let ok_rx = queue.submit(b"ok".to_vec()).await.unwrap();
        let bad_rx = queue.submit(b"bad".to_vec()).await.unwrap();
        queue.close();

        let mut source = connector.connect(1).await.unwrap();
        let processor: Arc<dyn EventProcessor> = Arc::new(FlakyProcessor);
        let mut backoff = BackoffController::new(RetryPolicy::default());
        let (_tx, mut shutdown) = watch::channel(false);

        let exit = run_consumer(1, &mut source, &processor, &mut backoff, &mut shutdown)
            .await
            .unwrap();

        assert_eq!(exit, ConsumerExit::Closed);
        assert_eq!(ok_rx.await.unwrap(), AckOutcome::Ack);
        assert_eq!(bad_rx.await.unwrap(), AckOutcome::NackDiscard);
        assert_eq!(backoff.attempts(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_empty_queue() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();

        let mut source = connector.connect(1).await.unwrap();
        let processor: Arc<dyn EventProcessor> = Arc::new(FlakyProcessor);
        let mut backoff = BackoffController::new(RetryPolicy::default());
        let (tx, mut shutdown) = watch::channel(false);

        let handle = tokio::spawn(async move {
            run_consumer(1, &mut source, &processor, &mut backoff, &mut shutdown).await
        });

        tx.send(true).unwrap();
        let exit = handle.await.unwrap().unwrap();
        assert_eq!(exit, ConsumerExit::Cancelled);

        // Queue was never drained
        drop(queue);
    }
}
