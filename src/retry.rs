//! Exponential backoff around fallible async operations.

use std::future::Future;
use std::time::Duration;

/// Backoff configuration. `retries` is the number of *additional* attempts
/// after the first failure, so the operation runs at most `retries + 1` times.
#[derive(Clone, Copy, Debug)]
pub struct RetryOpts {
    pub retries: u32,
    pub min_delay: Duration,
    pub factor: u32,
}

impl Default for RetryOpts {
    fn default() -> Self {
        Self {
            retries: 3,
            min_delay: Duration::from_millis(500),
            factor: 2,
        }
    }
}

impl RetryOpts {
    /// The standard budget for provider and media-tool calls.
    pub fn provider() -> Self {
        Self {
            retries: 2,
            ..Self::default()
        }
    }

    /// No sleeping between attempts. Test use.
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            min_delay: Duration::ZERO,
            factor: 1,
        }
    }
}

/// Run `op`, retrying on failure with exponential backoff: the sleep before
/// attempt `n + 1` is `min_delay * factor^(n-1)`. Every failure class is
/// retried; exhausting the budget returns the last error.
pub async fn retry<T, E, F, Fut>(opts: RetryOpts, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= opts.retries {
                    return Err(err);
                }
                let delay = opts.min_delay * opts.factor.saturating_pow(attempt);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
