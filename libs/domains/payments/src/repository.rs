use async_trait::async_trait;

use crate::error::PaymentResult;
use crate::models::{CreatePayment, Payment, StatusUpdate};

/// Repository trait for Payment persistence
///
/// Defines the data access interface for payments; the Postgres
/// implementation lives in [`crate::postgres`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record a new pending payment
    async fn insert(&self, input: CreatePayment) -> PaymentResult<Payment>;

    /// Get a payment by internal id
    async fn get(&self, id: i64) -> PaymentResult<Payment>;

    /// Get a payment by its Stripe payment intent id
    async fn get_by_intent(&self, stripe_payment_intent_id: &str) -> PaymentResult<Payment>;

    /// Apply a status transition with optimistic locking
    async fn update_status(&self, update: StatusUpdate) -> PaymentResult<Payment>;
}
