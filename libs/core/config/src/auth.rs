use crate::{env_or_default, env_required, ConfigError, FromEnv};

/// Bearer-token validation settings for the HTTP API.
///
/// Tokens are issued by the upstream api-gateway; this service only
/// validates them.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl FromEnv for JwtConfig {
    /// - JWT_SECRET: required
    /// - JWT_ISSUER: defaults to "api-gateway"
    /// - JWT_AUDIENCE: required
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env_required("JWT_SECRET")?,
            issuer: env_or_default("JWT_ISSUER", "api-gateway"),
            audience: env_required("JWT_AUDIENCE")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_from_env() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", Some("sekrit")),
                ("JWT_ISSUER", None),
                ("JWT_AUDIENCE", Some("payments.example.com")),
            ],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, "sekrit");
                assert_eq!(config.issuer, "api-gateway");
                assert_eq!(config.audience, "payments.example.com");
            },
        );
    }

    #[test]
    fn test_jwt_config_missing_secret() {
        temp_env::with_vars(
            [
                ("JWT_SECRET", None::<&str>),
                ("JWT_AUDIENCE", Some("payments.example.com")),
            ],
            || {
                let err = JwtConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_SECRET"));
            },
        );
    }
}
