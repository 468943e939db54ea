use std::time::Duration;

/// Bounded reconnect policy for TCP sends.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total send attempts, the first one included. Default: 5.
    pub max_attempts: u32,
    /// Wait before the first retry. Default: 1 s.
    pub initial_backoff: Duration,
    /// Growth factor between waits. Default: 2.
    pub multiplier: f64,
    /// Upper bound for a single wait. Default: 30 s.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first dropped connection.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// The waits before each retry; one fewer than `max_attempts`.
    ///
    /// Computed lazily. A wait that would overflow, or a multiplier that is
    /// not finite, yields `max_backoff`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let retries = self.max_attempts.saturating_sub(1) as usize;
        let max_backoff = self.max_backoff;
        let multiplier = self.multiplier.max(1.0);
        std::iter::successors(Some(self.initial_backoff.min(max_backoff)), move |prev| {
            let next = Duration::try_from_secs_f64(prev.as_secs_f64() * multiplier)
                .unwrap_or(max_backoff);
            Some(next.min(max_backoff))
        })
        .take(retries)
    }
}
