use crate::{env_required, ConfigError, FromEnv};

/// Stripe credentials for the webhook and payment-intent endpoints
#[derive(Clone)]
pub struct StripeConfig {
    pub api_key: String,
    pub webhook_secret: String,
}

// Manual Debug so credentials never end up in logs.
impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .finish()
    }
}

impl FromEnv for StripeConfig {
    /// Requires STRIPE_API_KEY and STRIPE_WEBHOOK_SECRET.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("STRIPE_API_KEY")?,
            webhook_secret: env_required("STRIPE_WEBHOOK_SECRET")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_config_from_env() {
        temp_env::with_vars(
            [
                ("STRIPE_API_KEY", Some("sk_test_123")),
                ("STRIPE_WEBHOOK_SECRET", Some("whsec_456")),
            ],
            || {
                let config = StripeConfig::from_env().unwrap();
                assert_eq!(config.api_key, "sk_test_123");
                assert_eq!(config.webhook_secret, "whsec_456");
            },
        );
    }

    #[test]
    fn test_stripe_config_missing_key() {
        temp_env::with_vars(
            [
                ("STRIPE_API_KEY", None::<&str>),
                ("STRIPE_WEBHOOK_SECRET", Some("whsec_456")),
            ],
            || {
                assert!(StripeConfig::from_env().is_err());
            },
        );
    }

    #[test]
    fn test_stripe_config_debug_redacts() {
        let config = StripeConfig {
            api_key: "sk_live_secret".to_string(),
            webhook_secret: "whsec_secret".to_string(),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk_live_secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
