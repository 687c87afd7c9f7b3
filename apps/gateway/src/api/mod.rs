pub mod health;
pub mod payments;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{jwt_auth_middleware, rate_limit_middleware};
use crate::state::AppState;

/// Request bodies above this size are rejected outright.
const MAX_BODY_BYTES: usize = 8 << 20;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/stripe/v1/create-payment-intent",
            post(payments::create_payment_intent),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/ready", get(health::readiness))
        .route("/metrics", get(health::metrics))
        .route("/stripe/v1/webhook", post(payments::webhook))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
