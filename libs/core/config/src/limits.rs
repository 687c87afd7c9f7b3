use crate::{env_parse_or_default, ConfigError, FromEnv};

/// Per-client request rate limiting settings
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Sustained requests per second per client
    pub rps: u32,
    /// Burst capacity per client
    pub burst: u32,
    /// Maximum number of tracked clients (bounded map)
    pub max_clients: usize,
    /// Seconds of inactivity before a client entry is evicted
    pub idle_ttl_secs: u64,
}

impl FromEnv for RateLimitConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: env_parse_or_default("RATE_LIMIT_ENABLED", true)?,
            rps: env_parse_or_default("RATE_LIMIT_RPS", 2u32)?,
            burst: env_parse_or_default("RATE_LIMIT_BURST", 4u32)?,
            max_clients: env_parse_or_default("RATE_LIMIT_MAX_CLIENTS", 10_000usize)?,
            idle_ttl_secs: env_parse_or_default("RATE_LIMIT_IDLE_TTL_SECS", 180u64)?,
        })
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rps: 2,
            burst: 4,
            max_clients: 10_000,
            idle_ttl_secs: 180,
        }
    }
}
