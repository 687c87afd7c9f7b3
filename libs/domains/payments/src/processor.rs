//! Stripe event processing.
//!
//! Consumes the webhook events republished on the broker and applies the
//! matching status transition to the stored payment.

use amqp_worker::{EventProcessor, ProcessingError};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::PaymentError;
use crate::models::{PaymentStatus, StatusUpdate};
use crate::repository::PaymentRepository;

/// Stripe webhook event envelope. Only the fields we route on are decoded.
#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: PaymentIntent,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    #[serde(default)]
    last_payment_error: Option<LastPaymentError>,
}

#[derive(Debug, Deserialize)]
struct LastPaymentError {
    #[serde(default)]
    message: Option<String>,
}

/// Applies Stripe payment-intent events to the payment store.
pub struct PaymentEventProcessor {
    repository: Arc<dyn PaymentRepository>,
}

impl PaymentEventProcessor {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    fn transition(event: &StripeEvent) -> Option<StatusUpdate> {
        let intent = &event.data.object;
        match event.event_type.as_str() {
            "payment_intent.succeeded" => Some(StatusUpdate {
                stripe_payment_intent_id: intent.id.clone(),
                status: PaymentStatus::Succeeded,
                captured: true,
                failure_reason: None,
            }),
            "payment_intent.payment_failed" => Some(StatusUpdate {
                stripe_payment_intent_id: intent.id.clone(),
                status: PaymentStatus::Failed,
                captured: false,
                failure_reason: intent
                    .last_payment_error
                    .as_ref()
                    .and_then(|e| e.message.clone()),
            }),
            "payment_intent.canceled" => Some(StatusUpdate {
                stripe_payment_intent_id: intent.id.clone(),
                status: PaymentStatus::Canceled,
                captured: false,
                failure_reason: None,
            }),
            _ => None,
        }
    }
}

#[async_trait]
impl EventProcessor for PaymentEventProcessor {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessingError> {
        if payload.is_empty() {
            return Err(ProcessingError::new("empty message body"));
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| ProcessingError::new(format!("undecodable event: {e}")))?;

        let Some(update) = Self::transition(&event) else {
            warn!(event_type = %event.event_type, "unhandled event type");
            return Err(ProcessingError::new(format!(
                "unhandled event type: {}",
                event.event_type
            )));
        };

        let intent_id = update.stripe_payment_intent_id.clone();
        let status = update.status;

        match self.repository.update_status(update).await {
            Ok(_) => {
                info!(intent = %intent_id, %status, "payment updated");
                Ok(())
            }
            Err(PaymentError::NotFound) => Err(ProcessingError::new(format!(
                "no payment for intent {intent_id}"
            ))),
            Err(err) => Err(ProcessingError::new(err.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "PaymentEventProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payment;
    use crate::repository::MockPaymentRepository;
    use chrono::Utc;

    fn payment(status: PaymentStatus) -> Payment {
        Payment {
            id: 1,
            order_id: 10,
            user_id: 20,
            stripe_payment_intent_id: "pi_123".to_string(),
            amount_cents: 4999,
            currency: "eur".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: None,
            payment_method: "card".to_string(),
            captured: status == PaymentStatus::Succeeded,
            failure_reason: None,
            metadata: "{}".to_string(),
            version: 2,
        }
    }

    fn event(event_type: &str) -> Vec<u8> {
        serde_json::json!({
            "type": event_type,
            "data": { "object": { "id": "pi_123" } }
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_succeeded_event_marks_payment_captured() {
        let mut repo = MockPaymentRepository::new();
        repo.expect_update_status()
            .withf(|update| {
                update.stripe_payment_intent_id == "pi_123"
                    && update.status == PaymentStatus::Succeeded
                    && update.captured
            })
            .returning(|_| Ok(payment(PaymentStatus::Succeeded)));

        let processor = PaymentEventProcessor::new(Arc::new(repo));
        processor
            .process(&event("payment_intent.succeeded"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_event_records_failure_reason() {
        let payload = serde_json::json!({
            "type": "payment_intent.payment_failed",
            "data": { "object": {
                "id": "pi_123",
                "last_payment_error": { "message": "card declined" }
            }}
        })
        .to_string()
        .into_bytes();

        let mut repo = MockPaymentRepository::new();
        repo.expect_update_status()
            .withf(|update| {
                update.status == PaymentStatus::Failed
                    && update.failure_reason.as_deref() == Some("card declined")
            })
            .returning(|_| Ok(payment(PaymentStatus::Failed)));

        let processor = PaymentEventProcessor::new(Arc::new(repo));
        processor.process(&payload).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_event_type_is_rejected() {
        let repo = MockPaymentRepository::new();
        let processor = PaymentEventProcessor::new(Arc::new(repo));

        let err = processor
            .process(&event("charge.refunded"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unhandled event type"));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_rejected() {
        let repo = MockPaymentRepository::new();
        let processor = PaymentEventProcessor::new(Arc::new(repo));

        assert!(processor.process(b"not json").await.is_err());
        assert!(processor.process(b"").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_payment_is_a_content_failure() {
        let mut repo = MockPaymentRepository::new();
        repo.expect_update_status()
            .returning(|_| Err(PaymentError::NotFound));

        let processor = PaymentEventProcessor::new(Arc::new(repo));
        let err = processor
            .process(&event("payment_intent.canceled"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("pi_123"));
    }
}
