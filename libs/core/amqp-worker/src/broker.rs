//! RabbitMQ client: connection, topology and the broker-backed delivery source.
//!
//! Topology is fixed at startup and idempotent to re-declare: a fanout durable
//! exchange, a durable queue, and a binding with an empty routing key (fanout
//! exchanges ignore routing keys).

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use lapin::{
    options::{
        BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind,
};
use tracing::{debug, info, warn};

use crate::error::WorkerError;
use crate::source::{AckHandle, Delivery, DeliverySource, NextDelivery, SourceConnector};

/// Broker connection settings and topology names.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub url: String,
    pub exchange: String,
    pub queue: String,
}

impl BrokerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            exchange: "stripe_events".to_string(),
            queue: "stripe_processing".to_string(),
        }
    }
}

/// Shared broker connection.
///
/// Cheap to clone channel factories off; the pool and the HTTP publisher both
/// hold a reference to the same client.
pub struct BrokerClient {
    connection: Arc<Connection>,
    config: BrokerConfig,
}

impl BrokerClient {
    /// Connect and declare topology.
    ///
    /// Declarations are idempotent as long as the existing definitions match;
    /// a conflicting prior definition surfaces as a broker error.
    pub async fn connect(config: BrokerConfig) -> Result<Self, WorkerError> {
        let connection = Connection::connect(
            &config.url,
            ConnectionProperties::default().with_connection_name("gateway".into()),
        )
        .await?;

        let channel = connection.create_channel().await?;
        declare_topology(&channel, &config).await?;
        channel.close(200, "topology declared").await?;

        info!(
            exchange = %config.exchange,
            queue = %config.queue,
            "connected to broker"
        );

        Ok(Self {
            connection: Arc::new(connection),
            config,
        })
    }

    /// Connector handing out per-worker channels with prefetch 1.
    pub fn connector(&self) -> BrokerConnector {
        BrokerConnector {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
        }
    }

    /// Publisher for the configured exchange.
    pub async fn publisher(&self) -> Result<BrokerPublisher, WorkerError> {
        let channel = self.connection.create_channel().await?;
        Ok(BrokerPublisher {
            channel,
            exchange: self.config.exchange.clone(),
        })
    }

    /// Close the underlying connection.
    ///
    /// Tolerates a connection that already failed or was closed; double close
    /// is not an error.
    pub async fn close(&self) -> Result<(), WorkerError> {
        match self.connection.close(200, "shutting down").await {
            Ok(()) => Ok(()),
            Err(lapin::Error::InvalidConnectionState(_)) => {
                debug!("broker connection already closed");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

async fn declare_topology(channel: &Channel, config: &BrokerConfig) -> Result<(), WorkerError> {
    channel
        .exchange_declare(
            &config.exchange,
            ExchangeKind::Fanout,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_declare(
            &config.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_bind(
            &config.queue,
            &config.exchange,
            "",
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await?;

    Ok(())
}

/// Publishes events to the fanout exchange.
pub struct BrokerPublisher {
    channel: Channel,
    exchange: String,
}

impl BrokerPublisher {
    /// Publish a persistent message and wait for broker confirmation.
    pub async fn publish(&self, payload: &[u8]) -> Result<(), WorkerError> {
        self.channel
            .basic_publish(
                &self.exchange,
                "",
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(2),
            )
            .await?
            .await?;
        Ok(())
    }
}

/// Opens one channel per worker with prefetch 1 and a named consumer tag.
#[derive(Clone)]
pub struct BrokerConnector {
    connection: Arc<Connection>,
    config: BrokerConfig,
}

#[async_trait]
impl SourceConnector for BrokerConnector {
    async fn connect(&self, worker_id: usize) -> Result<Box<dyn DeliverySource>, WorkerError> {
        let channel = self.connection.create_channel().await?;

        // One unacknowledged message per worker at a time
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let consumer = channel
            .basic_consume(
                &self.config.queue,
                &format!("worker-{worker_id}"),
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        debug!(worker_id, queue = %self.config.queue, "consumer registered");

        Ok(Box::new(BrokerSource { consumer, channel }))
    }
}

struct BrokerSource {
    consumer: Consumer,
    // Held so the channel outlives the consumer stream
    #[allow(dead_code)]
    channel: Channel,
}

#[async_trait]
impl DeliverySource for BrokerSource {
    async fn next_delivery(&mut self) -> Result<NextDelivery, WorkerError> {
        match self.consumer.next().await {
            Some(Ok(delivery)) => Ok(NextDelivery::Delivery(Delivery::new(
                delivery.data,
                AckHandle::Broker(delivery.acker),
            ))),
            Some(Err(err)) => {
                warn!(error = %err, "consumer stream error");
                Err(err.into())
            }
            // The broker cancelled the consumer or the channel closed cleanly
            None => Ok(NextDelivery::Closed),
        }
    }
}
