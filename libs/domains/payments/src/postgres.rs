//! Postgres implementation of the payment repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{PaymentError, PaymentResult};
use crate::models::{CreatePayment, Payment, StatusUpdate};
use crate::repository::PaymentRepository;

const PAYMENT_COLUMNS: &str = "id, order_id, user_id, stripe_payment_intent_id, amount_cents, \
     currency, status, created_at, updated_at, payment_method, captured, failure_reason, \
     metadata, version";

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn insert(&self, input: CreatePayment) -> PaymentResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments
                (order_id, user_id, stripe_payment_intent_id, amount_cents, currency,
                 status, payment_method, captured, metadata, version)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, false, $7, 1)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(input.order_id)
        .bind(input.user_id)
        .bind(&input.stripe_payment_intent_id)
        .bind(input.amount_cents)
        .bind(&input.currency)
        .bind(&input.payment_method)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn get(&self, id: i64) -> PaymentResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn get_by_intent(&self, stripe_payment_intent_id: &str) -> PaymentResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE stripe_payment_intent_id = $1"
        ))
        .bind(stripe_payment_intent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn update_status(&self, update: StatusUpdate) -> PaymentResult<Payment> {
        let current = self.get_by_intent(&update.stripe_payment_intent_id).await?;

        // Optimistic lock: the version must not have moved under us
        let updated = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $1,
                captured = $2,
                failure_reason = $3,
                updated_at = now(),
                version = version + 1
            WHERE stripe_payment_intent_id = $4 AND version = $5
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(update.status)
        .bind(update.captured)
        .bind(&update.failure_reason)
        .bind(&update.stripe_payment_intent_id)
        .bind(current.version)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(PaymentError::EditConflict)
    }
}
