use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_helpers::{run_health_checks, HealthCheckFuture, HealthResponse};

use crate::state::AppState;

pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.config.app.version))
}

/// Readiness: verifies the database answers before reporting ready.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let db = state.db.clone();
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "database",
        Box::pin(async move {
            sqlx::query("SELECT 1")
                .execute(&db)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string())
        }),
    )];

    run_health_checks(checks).await
}

/// Prometheus metrics in text exposition format.
pub async fn metrics() -> (StatusCode, String) {
    (StatusCode::OK, amqp_worker::render_metrics())
}
