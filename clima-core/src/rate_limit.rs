use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::LookupError;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2000);

/// Enforces a minimum interval between user-initiated searches.
///
/// The recorded timestamp only moves forward, and only when a check passes.
#[derive(Debug)]
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Gate a search. Must run before any request for that search is issued.
    pub fn check(&self) -> Result<(), LookupError> {
        self.check_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> Result<(), LookupError> {
        let mut last = self.last_call.lock();

        if let Some(prev) = *last {
            let elapsed = now.saturating_duration_since(prev);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "search rate limited");
                return Err(LookupError::RateLimited(wait));
            }
        }

        *last = Some(now);
        Ok(())
    }
}
