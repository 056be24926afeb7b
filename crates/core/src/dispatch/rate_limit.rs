//! Delayed replay of rate-limited requests
//!
//! When a response carries a positive `retry_after_seconds`, the same
//! descriptor is replayed after that delay. Replays are counted on the
//! descriptor and capped, so a persistently limited endpoint fails after a
//! bounded amount of real time instead of stalling the caller.

use std::time::Duration;

use gamelink_domain::constants::{DEFAULT_MAX_RATE_LIMIT_DELAY_SECS, MAX_RATE_LIMIT_RETRIES};
use gamelink_domain::{RequestDescriptor, ResponseEnvelope, TerminalReason};
use tracing::{debug, warn};

/// Schedules rate-limit replays.
#[derive(Debug, Clone)]
pub struct RateLimitRetryQueue {
    max_retries: u32,
    max_delay: Duration,
}

impl Default for RateLimitRetryQueue {
    fn default() -> Self {
        Self::new(MAX_RATE_LIMIT_RETRIES, Duration::from_secs(DEFAULT_MAX_RATE_LIMIT_DELAY_SECS))
    }
}

impl RateLimitRetryQueue {
    /// Queue allowing `max_retries` replays, each delayed at most
    /// `max_delay`.
    pub fn new(max_retries: u32, max_delay: Duration) -> Self {
        Self { max_retries, max_delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait out the server-imposed delay and hand back the descriptor to
    /// replay.
    ///
    /// Returns the terminal "exceeded retry budget" envelope without
    /// waiting when the descriptor has used up its replays.
    pub async fn schedule_retry(
        &self,
        descriptor: RequestDescriptor,
        delay: Duration,
    ) -> Result<RequestDescriptor, ResponseEnvelope> {
        let used = descriptor.rate_limit_retries();
        if used >= self.max_retries {
            warn!(
                path = %descriptor.path(),
                retries = used,
                "rate limit retry budget exhausted"
            );
            return Err(ResponseEnvelope::terminal(
                TerminalReason::RetryBudgetExceeded,
                descriptor.correlation_id().map(str::to_owned),
            )
            .with_auth_retries(descriptor.retry_count())
            .with_rate_limit_retries(used));
        }

        let delay = delay.min(self.max_delay);
        debug!(
            path = %descriptor.path(),
            retry = used + 1,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "rate limited, scheduling retry"
        );
        tokio::time::sleep(delay).await;

        Ok(descriptor.next_rate_limit_attempt())
    }
}
