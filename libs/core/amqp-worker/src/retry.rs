//! Per-worker retry state with a linear backoff schedule.

use crate::error::WorkerError;
use std::time::Duration;

/// Retry policy shared by all workers in a pool.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Consecutive failures before a worker gives up (default 5)
    pub max_attempts: u32,
    /// Base delay of the linear schedule: `delay(n) = n * base_delay`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Backoff controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffState {
    /// Consuming normally
    Active,
    /// Waiting out a backoff delay
    Backoff,
    /// Gave up after exhausting retries
    Failed,
    /// Stopped by cancellation
    Stopped,
}

/// What the worker loop should do after a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait out the delay, then retry
    Backoff(Duration),
    /// Max attempts reached; surface a terminal error
    GiveUp,
}

/// Attempt counter and state machine for one worker.
///
/// The counter resets to zero on any successful consume cycle; it only
/// accumulates across *consecutive* infrastructure failures.
#[derive(Debug)]
pub struct BackoffController {
    policy: RetryPolicy,
    attempts: u32,
    state: BackoffState,
}

impl BackoffController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: BackoffState::Active,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> BackoffState {
        self.state
    }

    /// A consume cycle succeeded: reset the counter, stay active.
    pub fn record_success(&mut self) {
        self.attempts = 0;
        self.state = BackoffState::Active;
    }

    /// A recoverable failure occurred: increment and decide.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.attempts += 1;

        if self.attempts >= self.policy.max_attempts {
            self.state = BackoffState::Failed;
            RetryDecision::GiveUp
        } else {
            self.state = BackoffState::Backoff;
            RetryDecision::Backoff(self.policy.delay_for(self.attempts))
        }
    }

    /// The backoff delay elapsed without cancellation.
    pub fn resume(&mut self) {
        self.state = BackoffState::Active;
    }

    /// Cancellation observed; the worker exits without error.
    pub fn stop(&mut self) {
        self.state = BackoffState::Stopped;
    }

    /// Build the terminal error reported when retries are exhausted.
    pub fn exhausted(&self, worker_id: usize, last_error: WorkerError) -> WorkerError {
        WorkerError::RetriesExhausted {
            worker_id,
            attempts: self.attempts,
            source: Box::new(last_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_millis(100))
    }

    #[test]
    fn test_linear_delay_schedule() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_until_max_attempts() {
        let mut controller = BackoffController::new(policy());

        // Attempts 1..=4 back off with delay = attempt * base
        for attempt in 1..5u32 {
            match controller.record_failure() {
                RetryDecision::Backoff(delay) => {
                    assert_eq!(delay, Duration::from_millis(100) * attempt);
                    assert_eq!(controller.state(), BackoffState::Backoff);
                    controller.resume();
                    assert_eq!(controller.state(), BackoffState::Active);
                }
                RetryDecision::GiveUp => panic!("gave up before max attempts"),
            }
        }

        // The fifth consecutive failure is terminal, with no further wait
        assert_eq!(controller.record_failure(), RetryDecision::GiveUp);
        assert_eq!(controller.state(), BackoffState::Failed);
        assert_eq!(controller.attempts(), 5);
    }

    #[test]
    fn test_success_resets_counter() {
        let mut controller = BackoffController::new(policy());

        assert_eq!(controller.attempts(), 0);
        controller.record_failure();
        controller.record_failure();
        assert_eq!(controller.attempts(), 2);

        controller.record_success();
        assert_eq!(controller.attempts(), 0);
        assert_eq!(controller.state(), BackoffState::Active);

        // Counter never accumulates across unrelated successes
        controller.record_success();
        controller.record_success();
        assert_eq!(controller.attempts(), 0);
    }

    #[test]
    fn test_stop_on_cancellation() {
        let mut controller = BackoffController::new(policy());
        controller.record_failure();
        controller.stop();
        assert_eq!(controller.state(), BackoffState::Stopped);
    }

    #[test]
    fn test_exhausted_error_identifies_worker() {
        let mut controller = BackoffController::new(RetryPolicy::new(1, Duration::from_millis(10)));
        assert_eq!(controller.record_failure(), RetryDecision::GiveUp);

        let err = controller.exhausted(2, WorkerError::Topology("boom".to_string()));
        match err {
            WorkerError::RetriesExhausted {
                worker_id,
                attempts,
                ..
            } => {
                assert_eq!(worker_id, 2);
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
