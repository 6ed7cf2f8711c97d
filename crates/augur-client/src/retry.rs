//! Backoff for the two account reads.
//!
//! `GET /v1/users/me` and `GET /v1/configs` are safe to repeat, so a
//! transient failure there is retried a couple of times before the purchase
//! gate gives up. Report submission and usage-history probes never go
//! through here: a duplicate submit could charge twice, and a failed probe
//! is terminal for the job.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info_span, warn, Instrument};

use crate::error::{ClientError, ClientResult};
use crate::metrics::record_retry;

/// How many times an account read is repeated and how long to wait between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first one. Zero means a single call.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Upper bound on any wait, including a server-supplied `Retry-After`.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// One attempt, no waiting.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// `AUGUR_RETRY_MAX`, `AUGUR_RETRY_BASE_MS` and `AUGUR_RETRY_MAX_MS`, each
    /// falling back to the default when unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_parse("AUGUR_RETRY_MAX").unwrap_or(defaults.max_retries),
            base_delay_ms: env_parse("AUGUR_RETRY_BASE_MS").unwrap_or(defaults.base_delay_ms),
            max_delay_ms: env_parse("AUGUR_RETRY_MAX_MS").unwrap_or(defaults.max_delay_ms),
        }
    }

    /// Longest wait this policy allows. Never below the base delay.
    fn ceiling_ms(&self) -> u64 {
        self.max_delay_ms.max(self.base_delay_ms)
    }

    /// Wait before the retry following failed attempt `attempt` (0-based).
    ///
    /// A `Retry-After` from a 429 wins over the computed backoff but is still
    /// clamped to the ceiling, so a server asking for a minute cannot stall
    /// the gate for a minute.
    fn backoff_delay(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(after) = retry_after_ms {
            return Duration::from_millis(after.min(self.ceiling_ms()));
        }

        let window = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.ceiling_ms());
        let jittered = (window as f64 * jitter_fraction()) as u64;
        Duration::from_millis(jittered.max(self.base_delay_ms))
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

/// Value in `[0, 1)` taken from the sub-second clock.
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    f64::from(nanos % 1000) / 1000.0
}

/// Run an account read, repeating it on transient failures.
///
/// Network errors, 429 and 5xx are transient. Anything else, 401 included,
/// is returned on the spot; token refresh is handled one layer down.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, operation: &str, op: F) -> ClientResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    loop {
        let span = info_span!("augur_retry", operation = %operation, attempt = attempt + 1);
        let error = match op().instrument(span).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= config.max_retries || !error.is_retryable() {
            return Err(error);
        }

        let delay = config.backoff_delay(attempt, error.retry_after_ms());
        warn!(
            operation = %operation,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "Account read failed, retrying: {}",
            error
        );
        record_retry(operation);

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn unavailable() -> ClientError {
        ClientError::from_http_status(503, "unavailable")
    }

    #[test]
    fn test_retry_after_is_used_when_below_ceiling() {
        let delay = RetryConfig::default().backoff_delay(0, Some(1500));
        assert_eq!(delay, Duration::from_millis(1500));
    }

    #[test]
    fn test_retry_after_is_capped_at_max_delay() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_delay(0, Some(60_000)), Duration::from_millis(2000));

        // A max below the base delay still allows the base delay.
        let inverted = RetryConfig {
            max_retries: 1,
            base_delay_ms: 500,
            max_delay_ms: 100,
        };
        assert_eq!(inverted.backoff_delay(0, Some(60_000)), Duration::from_millis(500));
    }

    #[test]
    fn test_backoff_stays_between_base_and_max() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 2000,
        };
        for attempt in [0, 1, 10, 64] {
            let delay = config.backoff_delay(attempt, None);
            assert!(delay >= Duration::from_millis(1000), "attempt {attempt}: {delay:?}");
            assert!(delay <= Duration::from_millis(2000), "attempt {attempt}: {delay:?}");
        }
    }

    #[test]
    fn test_jitter_fraction_range() {
        let fraction = jitter_fraction();
        assert!((0.0..1.0).contains(&fraction));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_makes_a_single_call() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = Instant::now();

        let result: ClientResult<()> = with_retry(&RetryConfig::disabled(), "fetch_configs", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        assert!(matches!(result, Err(ClientError::ServerError(503, _))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_waits_capped_retry_after() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 10,
            max_delay_ms: 300,
        };
        let started = Instant::now();

        let result = with_retry(&config, "fetch_current_user", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClientError::RateLimited(60_000))
            } else {
                Ok("profile")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "profile");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&RetryConfig::default(), "fetch_configs", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(unavailable())
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: ClientResult<()> = with_retry(&RetryConfig::default(), "fetch_current_user", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::from_http_status(401, "expired"))
        })
        .await;

        assert!(matches!(result, Err(ClientError::Unauthorized(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let config = RetryConfig {
            max_retries: 2,
            base_delay_ms: 10,
            max_delay_ms: 20,
        };
        let result: ClientResult<()> = with_retry(&config, "fetch_configs", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::from_http_status(500, "boom"))
        })
        .await;

        assert!(matches!(result, Err(ClientError::ServerError(500, _))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
