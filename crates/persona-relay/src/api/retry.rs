//! Retry policy: attempt budget, delay schedule, and failure classification.
//!
//! Retries only transient provider failures (429 and any 5xx). A 400/422 is a
//! structural problem with the request and is handed back to the caller,
//! which may try one flattened resend. Everything else (auth errors, network
//! failures, unreadable bodies) stops the loop.

use std::time::Duration;

use crate::error::ProviderError;

/// Attempt budget and wait schedule for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. `0` never calls the
    /// model at all.
    pub max_attempts: u32,
    /// Wait after the 1st, 2nd, ... failed attempt. The last entry repeats for
    /// any further attempts; an empty schedule means no wait.
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000),
            ],
        }
    }
}

impl RetryPolicy {
    /// Default schedule with a different attempt budget.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// A policy that retries without waiting. Handy in tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delays: Vec::new(),
        }
    }

    /// Wait after the `failures`-th failed attempt (1-based).
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        let Some(last) = self.delays.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let idx = (failures.saturating_sub(1) as usize).min(last);
        self.delays[idx]
    }

    /// Total time spent waiting if every attempt fails transiently.
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|n| self.delay_for_attempt(n))
            .sum()
    }
}

/// How a failed attempt should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected to clear up; retry after a wait.
    Transient,
    /// The request's structure was rejected; retrying it unchanged is pointless.
    Fatal,
    /// Anything else; give up.
    Other,
}

/// Rate limiting or a server-side failure.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// The provider rejected the request body itself.
pub fn is_fatal_status(status: u16) -> bool {
    matches!(status, 400 | 422)
}

pub fn classify(error: &ProviderError) -> ErrorClass {
    match error.status() {
        Some(s) if is_transient_status(s) => ErrorClass::Transient,
        Some(s) if is_fatal_status(s) => ErrorClass::Fatal,
        _ => ErrorClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ProviderError {
        ProviderError::Http {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn default_policy_matches_documented_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(
            policy.delays,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(2000)
            ]
        );
    }

    #[test]
    fn delay_follows_schedule_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(2000));
    }

    #[test]
    fn empty_schedule_never_waits() {
        let policy = RetryPolicy::immediate(5);
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
        assert_eq!(policy.worst_case_backoff(), Duration::ZERO);
    }

    #[test]
    fn worst_case_backoff_sums_waits_between_attempts() {
        assert_eq!(
            RetryPolicy::default().worst_case_backoff(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            RetryPolicy::with_attempts(5).worst_case_backoff(),
            Duration::from_millis(500 + 1000 + 2000 + 2000)
        );
    }

    #[test]
    fn transient_statuses() {
        assert_eq!(classify(&http(429)), ErrorClass::Transient);
        assert_eq!(classify(&http(500)), ErrorClass::Transient);
        assert_eq!(classify(&http(503)), ErrorClass::Transient);
        assert_eq!(classify(&http(599)), ErrorClass::Transient);
    }

    #[test]
    fn structural_statuses_are_fatal() {
        assert_eq!(classify(&http(400)), ErrorClass::Fatal);
        assert_eq!(classify(&http(422)), ErrorClass::Fatal);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(classify(&http(401)), ErrorClass::Other);
        assert_eq!(classify(&http(404)), ErrorClass::Other);
        assert_eq!(classify(&ProviderError::Request("timed out".into())), ErrorClass::Other);
        assert_eq!(classify(&ProviderError::Unconfigured), ErrorClass::Other);
        assert_eq!(classify(&ProviderError::Empty), ErrorClass::Other);
    }
}
