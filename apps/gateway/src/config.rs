use core_config::{
    amqp::AmqpConfig, app_info, auth::JwtConfig, limits::RateLimitConfig,
    postgres::PostgresConfig, server::GrpcConfig, server::ServerConfig, stripe::StripeConfig,
    worker::WorkerSettings, AppInfo, FromEnv,
};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub grpc: GrpcConfig,
    pub database: PostgresConfig,
    pub amqp: AmqpConfig,
    pub worker: WorkerSettings,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub stripe: StripeConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();

        Ok(Self {
            app: app_info!(),
            environment,
            server: ServerConfig::from_env()?,
            grpc: GrpcConfig::from_env()?,
            database: PostgresConfig::from_env()?, // Required - will fail if not set
            amqp: AmqpConfig::from_env()?,         // Required - will fail if not set
            worker: WorkerSettings::from_env()?,
            jwt: JwtConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
        })
    }
}
