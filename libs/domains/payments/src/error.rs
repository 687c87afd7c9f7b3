use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment not found")]
    NotFound,

    #[error("payment was modified concurrently, please retry")]
    EditConflict,

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(String),
}

pub type PaymentResult<T> = Result<T, PaymentError>;

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => PaymentError::NotFound,
            other => PaymentError::Database(other.to_string()),
        }
    }
}

/// Convert PaymentError to AppError for standardized error responses
impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound => AppError::NotFound("payment not found".to_string()),
            PaymentError::EditConflict => {
                AppError::BadRequest("payment was modified concurrently, please retry".to_string())
            }
            PaymentError::Validation(msg) => AppError::BadRequest(msg),
            PaymentError::Database(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_row_not_found_becomes_not_found() {
        let err: PaymentError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, PaymentError::NotFound));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_errors_are_internal() {
        let err = PaymentError::Database("connection reset".to_string());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
