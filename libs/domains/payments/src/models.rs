use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment lifecycle status, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Payment entity - one row per Stripe payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,

    pub stripe_payment_intent_id: String,

    pub amount_cents: i32,
    pub currency: String,

    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    pub payment_method: String,
    pub captured: bool,

    pub failure_reason: Option<String>,

    pub metadata: String,
    #[serde(skip_serializing)]
    pub version: i32,
}

/// Input for recording a new pending payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub order_id: i64,
    pub user_id: i64,
    pub stripe_payment_intent_id: String,
    pub amount_cents: i32,
    pub currency: String,
    pub payment_method: String,
    pub metadata: String,
}

/// Status transition applied when a Stripe event arrives.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub stripe_payment_intent_id: String,
    pub status: PaymentStatus,
    pub captured: bool,
    pub failure_reason: Option<String>,
}
