//! Retry policy for transient HTTP failures.
//!
//! Retries are immediate: the next attempt starts as soon as the previous
//! response has been fully read. Only statuses are retried; a timed-out or
//! cancelled attempt ends the request.

use orthoqa_core::Method;

/// Returns true for 408, 429 and every 5xx status.
pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Retry budget for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts allowed after the first.
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` extra attempts.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(0)
    }

    /// Resolves the budget for `method`: explicit override, else `get_retries` for GET, else none.
    pub fn for_method(method: Method, explicit: Option<u32>, get_retries: u32) -> Self {
        let retries = explicit.unwrap_or(match method {
            Method::Get => get_retries,
            _ => 0,
        });
        Self::new(retries)
    }

    /// Total attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether attempt number `attempt` (1-based) that ended with `status` is followed by another.
    pub fn should_retry(&self, attempt: u32, status: u16) -> bool {
        attempt <= self.max_retries && is_retryable_status(status)
    }

    /// Number of the attempt that follows `attempt`, or `None` when the request ends here.
    pub fn next_attempt(&self, attempt: u32, status: u16) -> Option<u32> {
        if self.should_retry(attempt, status) {
            attempt.checked_add(1)
        } else {
            None
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Method::Get.default_retries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504, 599] {
            assert!(is_retryable_status(status), "{status} should retry");
        }
        for status in [200, 301, 400, 401, 403, 404, 409, 422, 600] {
            assert!(!is_retryable_status(status), "{status} should not retry");
        }
    }

    #[test]
    fn test_budget_bound() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(1, 500));
        assert!(policy.should_retry(2, 503));
        assert!(!policy.should_retry(3, 500));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_next_attempt() {
        let policy = RetryPolicy::new(1);
        assert_eq!(policy.next_attempt(1, 502), Some(2));
        assert_eq!(policy.next_attempt(2, 502), None);
        assert_eq!(policy.next_attempt(1, 404), None);
    }

    #[test]
    fn test_unbounded_budget_does_not_overflow() {
        let policy = RetryPolicy::new(u32::MAX);
        assert_eq!(policy.max_attempts(), u32::MAX);
        assert_eq!(policy.next_attempt(u32::MAX - 1, 503), Some(u32::MAX));
        assert_eq!(policy.next_attempt(u32::MAX, 503), None);
    }

    #[test]
    fn test_non_retryable_never_retried() {
        let policy = RetryPolicy::new(5);
        assert!(!policy.should_retry(1, 400));
        assert!(policy.should_retry(1, 429));
    }

    #[test]
    fn test_method_defaults() {
        assert_eq!(RetryPolicy::for_method(Method::Get, None, 2).max_retries, 2);
        assert_eq!(RetryPolicy::for_method(Method::Post, None, 2).max_retries, 0);
        assert_eq!(RetryPolicy::for_method(Method::Post, Some(3), 2).max_retries, 3);
        assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
    }
}
