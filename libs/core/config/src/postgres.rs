use crate::{env_parse_or_default, env_required, ConfigError, FromEnv};

/// PostgreSQL connection configuration
#[derive(Clone, Debug)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

impl FromEnv for PostgresConfig {
    /// Requires DATABASE_URL; DATABASE_MAX_CONNECTIONS defaults to 10.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections: env_parse_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }
}
