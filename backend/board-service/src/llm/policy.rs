/// Timeout and retry policy for remote calls
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::LlmError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Every attempt is bounded by `attempt_timeout`; transient failures are retried.
#[derive(Debug, Clone)]
pub struct CallPolicy {
    pub attempt_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

impl CallPolicy {
    pub fn new(attempt_timeout: Duration, max_retries: u32) -> Self {
        Self {
            attempt_timeout,
            retry: RetryConfig {
                max_retries,
                ..Default::default()
            },
        }
    }

    pub async fn run<F, Fut, T>(&self, mut f: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 0;
        let mut backoff = self.retry.initial_backoff;

        loop {
            let outcome = match tokio::time::timeout(self.attempt_timeout, f()).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.attempt_timeout)),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= self.retry.max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let delay = calculate_backoff(backoff, self.retry.jitter);

                    warn!(
                        error = %e,
                        "Retry attempt {}/{}, waiting {:?}",
                        attempt, self.retry.max_retries, delay
                    );

                    tokio::time::sleep(delay).await;

                    backoff = Duration::from_millis(
                        ((backoff.as_millis() as f64 * self.retry.backoff_multiplier)
                            .min(self.retry.max_backoff.as_millis() as f64))
                            as u64,
                    );
                }
            }
        }
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let jitter_factor = 1.0 + rand::thread_rng().gen_range(-0.3..0.3);
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
