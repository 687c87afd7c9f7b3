//! Worker error types and recoverability classification.
//!
//! Failures are partitioned into two kinds with different handling:
//! - **Recoverable**: transient infrastructure faults (connection drops,
//!   protocol errors, network I/O), absorbed by the per-worker backoff loop
//! - **Fatal**: exhausted retries, surfaced to the pool

use thiserror::Error;

/// Error produced by the consumer infrastructure.
///
/// Content-level failures from the message processor are a separate type
/// ([`crate::ProcessingError`]) and never reach the retry loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Broker connection or protocol error
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    /// Network I/O error
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Topology declaration conflicted with an existing incompatible definition
    #[error("topology error: {0}")]
    Topology(String),

    /// The in-process delivery queue rejected an operation
    #[error("local queue error: {0}")]
    LocalQueue(String),

    /// A worker gave up after the configured number of consecutive failures
    #[error("worker {worker_id} exhausted max retries ({attempts}): {source}")]
    RetriesExhausted {
        worker_id: usize,
        attempts: u32,
        #[source]
        source: Box<WorkerError>,
    },
}

/// Stable classification tag consumed by the retry loop.
///
/// Collaborators branch on this tag, never on the concrete error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recoverability {
    /// Retry with backoff, bounded by the retry policy
    Recoverable,
    /// Never retry; propagate to the pool
    Fatal,
}

impl WorkerError {
    /// Classify this error for the retry loop.
    ///
    /// Broker, protocol and network errors are recoverable. Exhausted
    /// retries are fatal and must not be retried further. Anything not
    /// recognized defaults to recoverable, favoring availability over fast
    /// failure for unknown conditions.
    pub fn recoverability(&self) -> Recoverability {
        match self {
            WorkerError::Broker(_) => Recoverability::Recoverable,
            WorkerError::Io(_) => Recoverability::Recoverable,
            WorkerError::RetriesExhausted { .. } => Recoverability::Fatal,
            _ => Recoverability::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.recoverability() == Recoverability::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_broker_errors_are_recoverable() {
        let err = WorkerError::Broker(lapin::Error::ChannelsLimitReached);
        assert_eq!(err.recoverability(), Recoverability::Recoverable);
    }

    #[test]
    fn test_io_errors_are_recoverable() {
        let err = WorkerError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(err.recoverability(), Recoverability::Recoverable);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_exhausted_retries_are_fatal() {
        let err = WorkerError::RetriesExhausted {
            worker_id: 3,
            attempts: 5,
            source: Box::new(WorkerError::Topology("broker unreachable".to_string())),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("worker 3"));
        assert!(err.to_string().contains("5"));
    }

    #[test]
    fn test_unknown_kinds_default_to_recoverable() {
        let err = WorkerError::Topology("conflicting queue arguments".to_string());
        assert_eq!(err.recoverability(), Recoverability::Recoverable);
    }
}
