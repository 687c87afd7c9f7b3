use crate::{env_parse_or_default, ConfigError, FromEnv};
use std::time::Duration;

/// Consumer worker pool settings
#[derive(Clone, Debug)]
pub struct WorkerSettings {
    /// Number of concurrent consumer workers
    pub worker_count: usize,
    /// Maximum consecutive infrastructure failures before a worker gives up
    pub max_retries: u32,
    /// Base delay for the linear backoff schedule
    pub retry_base_delay: Duration,
}

impl FromEnv for WorkerSettings {
    /// - WORKER_COUNT: defaults to 5
    /// - WORKER_MAX_RETRIES: defaults to 5
    /// - WORKER_RETRY_BASE_DELAY_MS: defaults to 1000
    fn from_env() -> Result<Self, ConfigError> {
        let worker_count = env_parse_or_default("WORKER_COUNT", 5usize)?;
        let max_retries = env_parse_or_default("WORKER_MAX_RETRIES", 5u32)?;
        let base_delay_ms = env_parse_or_default("WORKER_RETRY_BASE_DELAY_MS", 1000u64)?;

        Ok(Self {
            worker_count,
            max_retries,
            retry_base_delay: Duration::from_millis(base_delay_ms),
        })
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            worker_count: 5,
            max_retries: 5,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}
