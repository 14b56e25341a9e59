//! Outcome of an admission-control check.

use std::time::Duration;

/// Result of counting one request against a client's rate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Configured requests per window.
    pub limit: u64,
    /// Requests still admitted in the current window.
    pub remaining: u64,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

impl RateDecision {
    /// Seconds a denied client should wait, rounded up and never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 || secs == 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(reset_after: Duration) -> RateDecision {
        RateDecision {
            allowed: false,
            limit: 3,
            remaining: 0,
            reset_after,
        }
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(decision(Duration::from_millis(59_100)).retry_after_secs(), 60);
        assert_eq!(decision(Duration::from_secs(60)).retry_after_secs(), 60);
    }

    #[test]
    fn test_retry_after_never_zero() {
        assert_eq!(decision(Duration::ZERO).retry_after_secs(), 1);
    }
}
