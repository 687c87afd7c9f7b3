//! Delivery sources and acknowledgment handles.
//!
//! A [`DeliverySource`] yields deliveries one at a time; a [`SourceConnector`]
//! establishes a fresh source for a worker, so a worker can reconnect after an
//! infrastructure failure without tearing down the pool.
//!
//! Two implementations exist: the broker-backed source (see [`crate::broker`])
//! and [`LocalQueue`], an in-process channel used for intra-process offload
//! and tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::error::WorkerError;

/// Final disposition of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Processed successfully; remove from the queue
    Ack,
    /// Not processed; return to the queue for redelivery
    NackRequeue,
    /// Rejected; drop without redelivery
    NackDiscard,
}

/// A single consumed message with its acknowledgment handle.
///
/// Acknowledgment methods take `self`, so a delivery can be settled at most
/// once; the compiler enforces the single-owner rule.
pub struct Delivery {
    pub payload: Vec<u8>,
    acker: AckHandle,
}

pub(crate) enum AckHandle {
    Broker(lapin::acker::Acker),
    Local(LocalAcker),
}

impl Delivery {
    pub(crate) fn new(payload: Vec<u8>, acker: AckHandle) -> Self {
        Self { payload, acker }
    }

    /// Acknowledge: the message is done and leaves the queue.
    pub async fn ack(self) -> Result<(), WorkerError> {
        match self.acker {
            AckHandle::Broker(acker) => {
                acker
                    .ack(lapin::options::BasicAckOptions::default())
                    .await?;
            }
            AckHandle::Local(acker) => acker.settle(AckOutcome::Ack),
        }
        Ok(())
    }

    /// Negatively acknowledge and requeue for another consumer.
    pub async fn nack_requeue(self) -> Result<(), WorkerError> {
        match self.acker {
            AckHandle::Broker(acker) => {
                acker
                    .nack(lapin::options::BasicNackOptions {
                        requeue: true,
                        ..Default::default()
                    })
                    .await?;
            }
            AckHandle::Local(acker) => acker.settle(AckOutcome::NackRequeue),
        }
        Ok(())
    }

    /// Negatively acknowledge and drop the message.
    pub async fn nack_discard(self) -> Result<(), WorkerError> {
        match self.acker {
            AckHandle::Broker(acker) => {
                acker
                    .nack(lapin::options::BasicNackOptions {
                        requeue: false,
                        ..Default::default()
                    })
                    .await?;
            }
            AckHandle::Local(acker) => acker.settle(AckOutcome::NackDiscard),
        }
        Ok(())
    }
}

/// Result of waiting for the next delivery.
pub enum NextDelivery {
    Delivery(Delivery),
    /// The source closed cleanly and will yield nothing more
    Closed,
}

/// Stream of deliveries owned by a single worker.
#[async_trait]
pub trait DeliverySource: Send {
    /// Wait for the next delivery.
    ///
    /// Cancel-safe: dropping the future before it resolves loses no message.
    async fn next_delivery(&mut self) -> Result<NextDelivery, WorkerError>;
}

/// Factory for per-worker delivery sources.
///
/// Called once at worker startup and again after each recoverable failure,
/// so implementations must tolerate repeated connects.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(&self, worker_id: usize) -> Result<Box<dyn DeliverySource>, WorkerError>;
}

// ---------------------------------------------------------------------------
// In-process queue
// ---------------------------------------------------------------------------

pub(crate) struct LocalAcker {
    outcome_tx: oneshot::Sender<AckOutcome>,
}

impl LocalAcker {
    fn settle(self, outcome: AckOutcome) {
        // The submitter may have stopped waiting; that is not an error.
        let _ = self.outcome_tx.send(outcome);
    }
}

struct LocalDelivery {
    payload: Vec<u8>,
    outcome_tx: oneshot::Sender<AckOutcome>,
}

/// Bounded in-process delivery queue.
///
/// Producers [`submit`](LocalQueue::submit) payloads and may await the
/// worker's acknowledgment decision. Consumers attach through
/// [`connector`](LocalQueue::connector); all sources created from one queue
/// share the underlying channel, so each delivery goes to exactly one worker.
pub struct LocalQueue {
    tx: mpsc::Sender<LocalDelivery>,
    shared_rx: Arc<Mutex<mpsc::Receiver<LocalDelivery>>>,
}

impl LocalQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            shared_rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Enqueue a payload. The returned receiver resolves with the worker's
    /// acknowledgment decision, or closes if the queue shuts down first.
    pub async fn submit(
        &self,
        payload: Vec<u8>,
    ) -> Result<oneshot::Receiver<AckOutcome>, WorkerError> {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        self.tx
            .send(LocalDelivery {
                payload,
                outcome_tx,
            })
            .await
            .map_err(|_| WorkerError::LocalQueue("queue is closed".to_string()))?;
        Ok(outcome_rx)
    }

    /// Connector handing out sources that drain this queue.
    pub fn connector(&self) -> LocalConnector {
        LocalConnector {
            shared_rx: Arc::clone(&self.shared_rx),
        }
    }

    /// Close the queue. Workers observe [`NextDelivery::Closed`] once the
    /// already-buffered deliveries are drained.
    pub fn close(self) {
        drop(self.tx);
    }
}

#[derive(Clone)]
pub struct LocalConnector {
    shared_rx: Arc<Mutex<mpsc::Receiver<LocalDelivery>>>,
}

#[async_trait]
impl SourceConnector for LocalConnector {
    async fn connect(&self, _worker_id: usize) -> Result<Box<dyn DeliverySource>, WorkerError> {
        Ok(Box::new(LocalSource {
            shared_rx: Arc::clone(&self.shared_rx),
        }))
    }
}

struct LocalSource {
    shared_rx: Arc<Mutex<mpsc::Receiver<LocalDelivery>>>,
}

#[async_trait]
impl DeliverySource for LocalSource {
    async fn next_delivery(&mut self) -> Result<NextDelivery, WorkerError> {
        let mut rx = self.shared_rx.lock().await;
        match rx.recv().await {
            Some(local) => Ok(NextDelivery::Delivery(Delivery::new(
                local.payload,
                AckHandle::Local(LocalAcker {
                    outcome_tx: local.outcome_tx,
                }),
            ))),
            None => Ok(NextDelivery::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_and_ack() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();

        let outcome_rx = queue.submit(b"payload".to_vec()).await.unwrap();

        let mut source = connector.connect(1).await.unwrap();
        match source.next_delivery().await.unwrap() {
            NextDelivery::Delivery(delivery) => {
                assert_eq!(delivery.payload, b"payload");
                delivery.ack().await.unwrap();
            }
            NextDelivery::Closed => panic!("queue closed unexpectedly"),
        }

        assert_eq!(outcome_rx.await.unwrap(), AckOutcome::Ack);
    }

    #[tokio::test]
    async fn test_nack_discard_observed_by_submitter() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();
        let outcome_rx = queue.submit(b"bad".to_vec()).await.unwrap();

        let mut source = connector.connect(1).await.unwrap();
        let NextDelivery::Delivery(delivery) = source.next_delivery().await.unwrap() else {
            panic!("expected a delivery");
        };
        delivery.nack_discard().await.unwrap();

        assert_eq!(outcome_rx.await.unwrap(), AckOutcome::NackDiscard);
    }

    #[tokio::test]
    async fn test_close_drains_buffered_deliveries_first() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();
        let _rx = queue.submit(b"one".to_vec()).await.unwrap();
        queue.close();

        let mut source = connector.connect(1).await.unwrap();
        match source.next_delivery().await.unwrap() {
            NextDelivery::Delivery(delivery) => {
                assert_eq!(delivery.payload, b"one");
                delivery.ack().await.unwrap();
            }
            NextDelivery::Closed => panic!("buffered delivery was lost"),
        }

        match source.next_delivery().await.unwrap() {
            NextDelivery::Closed => {}
            NextDelivery::Delivery(_) => panic!("expected the source to close"),
        }
    }

    #[tokio::test]
    async fn test_connect_after_close_yields_closed() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();
        queue.close();

        let mut source = connector.connect(1).await.unwrap();
        match source.next_delivery().await.unwrap() {
            NextDelivery::Closed => {}
            NextDelivery::Delivery(_) => panic!("expected closed"),
        }
    }

    #[tokio::test]
    async fn test_each_delivery_goes_to_one_consumer() {
        let queue = LocalQueue::new(8);
        let connector = queue.connector();
        let _a = queue.submit(b"a".to_vec()).await.unwrap();
        let _b = queue.submit(b"b".to_vec()).await.unwrap();

        let mut first = connector.connect(1).await.unwrap();
        let mut second = connector.connect(2).await.unwrap();

        let NextDelivery::Delivery(d1) = first.next_delivery().await.unwrap() else {
            panic!("expected a delivery");
        };
        let NextDelivery::Delivery(d2) = second.next_delivery().await.unwrap() else {
            panic!("expected a delivery");
        };

        let mut payloads = vec![d1.payload.clone(), d2.payload.clone()];
        payloads.sort();
        assert_eq!(payloads, vec![b"a".to_vec(), b"b".to_vec()]);

        d1.ack().await.unwrap();
        d2.ack().await.unwrap();
    }
}
