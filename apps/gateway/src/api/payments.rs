//! Payment endpoints: intent registration and the Stripe webhook.

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_helpers::AppError;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{info, warn};

use domain_payments::CreatePayment;

use crate::middleware::AuthenticatedUser;
use crate::state::AppState;

/// Accept webhook timestamps at most this far from now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub order_id: i64,
    pub stripe_payment_intent_id: String,
    pub amount_cents: i32,
    pub currency: String,
    pub payment_method: String,
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Record a pending payment for an intent created upstream.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<CreatePaymentIntentRequest>,
) -> Result<(StatusCode, Json<domain_payments::Payment>), AppError> {
    if body.amount_cents <= 0 {
        return Err(AppError::BadRequest(
            "amount_cents must be positive".to_string(),
        ));
    }
    if body.currency.len() != 3 {
        return Err(AppError::BadRequest(
            "currency must be a 3-letter ISO code".to_string(),
        ));
    }
    if body.stripe_payment_intent_id.is_empty() {
        return Err(AppError::BadRequest(
            "stripe_payment_intent_id is required".to_string(),
        ));
    }

    let payment = state
        .repository
        .insert(CreatePayment {
            order_id: body.order_id,
            user_id: user.user_id,
            stripe_payment_intent_id: body.stripe_payment_intent_id,
            amount_cents: body.amount_cents,
            currency: body.currency.to_lowercase(),
            payment_method: body.payment_method,
            metadata: body.metadata.unwrap_or_else(|| "{}".to_string()),
        })
        .await
        .map_err(AppError::from)?;

    info!(
        payment_id = payment.id,
        user_id = user.user_id,
        "payment intent recorded"
    );

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Stripe webhook: verify the signature, then republish the raw event on the
/// fanout exchange for the worker pool to process.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing Stripe-Signature header".to_string()))?;

    verify_signature(
        signature,
        &body,
        state.config.stripe.webhook_secret.as_bytes(),
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| {
        warn!(error = %e, "webhook signature rejected");
        AppError::BadRequest("invalid webhook signature".to_string())
    })?;

    state.publisher.publish(&body).await.map_err(|e| {
        AppError::ServiceUnavailable(format!("could not enqueue event: {e}"))
    })?;

    Ok(Json(json!({ "received": true })))
}

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against the
/// raw body: the signed payload is `"{t}.{body}"` keyed with the endpoint
/// secret, and the timestamp must be within tolerance.
fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    candidates.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| SignatureError::BadSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);

    for candidate in candidates {
        if mac.clone().verify_slice(&candidate).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

#[derive(Debug, thiserror::Error)]
enum SignatureError {
    #[error("missing timestamp")]
    MissingTimestamp,
    #[error("timestamp outside tolerance")]
    StaleTimestamp,
    #[error("missing v1 signature")]
    MissingSignature,
    #[error("invalid secret")]
    BadSecret,
    #[error("signature mismatch")]
    Mismatch,
}
