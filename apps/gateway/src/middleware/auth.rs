//! JWT bearer authentication.
//!
//! Tokens are issued by the upstream API gateway; this service only verifies
//! them. HS256, with issuer and audience pinned by configuration.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_helpers::AppError;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // Subject (user ID)
    pub iss: String, // Issuer
    pub aud: String, // Audience
    pub exp: i64,    // Expiration time
}

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

    let claims = verify_token(token, &state.config.jwt).map_err(|e| {
        warn!(error = %e, "jwt validation failed");
        AppError::Unauthorized("invalid or expired authentication token".to_string())
    })?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("invalid token subject".to_string()))?;

    request.extensions_mut().insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

fn verify_token(
    token: &str,
    config: &core_config::auth::JwtConfig,
) -> Result<JwtClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::auth::JwtConfig;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            issuer: "api-gateway".to_string(),
            audience: "payments.example.com".to_string(),
        }
    }

    fn token(claims: &JwtClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> JwtClaims {
        JwtClaims {
            sub: "42".to_string(),
            iss: "api-gateway".to_string(),
            aud: "payments.example.com".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
        }
    }

    #[test]
    fn test_valid_token_is_accepted() {
        let claims = verify_token(&token(&valid_claims(), "test-secret"), &config()).unwrap();
        assert_eq!(claims.sub, "42");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        assert!(verify_token(&token(&valid_claims(), "other-secret"), &config()).is_err());
    }

    #[test]
    fn test_wrong_issuer_is_rejected() {
        let mut claims = valid_claims();
        claims.iss = "someone-else".to_string();
        assert!(verify_token(&token(&claims, "test-secret"), &config()).is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let mut claims = valid_claims();
        claims.aud = "other.example.com".to_string();
        assert!(verify_token(&token(&claims, "test-secret"), &config()).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = valid_claims();
        claims.exp = chrono::Utc::now().timestamp() - 3600;
        assert!(verify_token(&token(&claims, "test-secret"), &config()).is_err());
    }
}
