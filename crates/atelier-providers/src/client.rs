//! Retrying generation client that hides key rotation and backoff.

use crate::classify::{ErrorClass, classify_error};
use crate::key_pool::KeyPool;
use atelier_core::{Error, ModelOracle, RateLimitStatus, Result, RetryConfig};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Client wrapping a model oracle with credential rotation, cooldown
/// tracking, and bounded retry.
///
/// This is the only component that suspends internally: a call can block
/// on backoff or cooldown waits for up to the configured maximum delay
/// per retry. Callers needing a hard deadline must impose one externally.
pub struct GenerationClient {
    /// Transport that performs the actual service call.
    oracle: Arc<dyn ModelOracle>,
    /// Shared credential pool.
    pool: Arc<KeyPool>,
    /// Retry and backoff settings.
    retry: RetryConfig,
}

impl GenerationClient {
    /// Creates a client over the given oracle and key pool.
    pub fn new(oracle: Arc<dyn ModelOracle>, pool: Arc<KeyPool>, retry: RetryConfig) -> Self {
        Self {
            oracle,
            pool,
            retry,
        }
    }

    /// Runs one prompt against the oracle, retrying across keys and
    /// transient failures.
    ///
    /// A quota response cools the leased key down and rotates to the next
    /// free key immediately; rotation costs nothing against the transient
    /// retry budget and is naturally bounded because each rotation has
    /// just put one more key on cooldown. When every key is cooling down
    /// the call sleeps until the soonest reset (with a configured floor)
    /// before trying again; those full-pool waits have their own budget.
    /// Transient failures back off exponentially. Fatal failures return
    /// at once.
    ///
    /// # Errors
    /// Returns the oracle's error verbatim for fatal failures, or
    /// [`Error::RetriesExhausted`] once a budget runs out.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut transient_attempts = 0_u32;
        let mut limit_waits = 0_u32;
        let mut total_failures = 0_u32;
        let mut last_error: Option<Error> = None;

        loop {
            let lease = self.pool.current();
            self.pool.record_request(lease.index);

            let outcome = self.oracle.generate(&lease.credential, prompt).await;
            let error = match outcome {
                Ok(text) => return Ok(text),
                Err(error) => error,
            };

            total_failures += 1;
            match classify_error(&error.to_string(), self.retry.default_retry_after()) {
                ErrorClass::RateLimited(retry_after) => {
                    self.pool.mark_limited(lease.index, retry_after);
                    last_error = Some(error);

                    if self.pool.has_available() {
                        debug!("key {} cooling down, rotating to next key", lease.index + 1);
                        continue;
                    }

                    if limit_waits >= self.retry.max_attempts {
                        break;
                    }
                    limit_waits += 1;

                    let wait = self.pool.shortest_wait().max(self.retry.min_limit_wait());
                    warn!(
                        "all keys cooling down, waiting {:.1}s",
                        wait.as_secs_f64()
                    );
                    sleep(wait).await;
                    self.pool.rearm_expired();
                }
                ErrorClass::Transient => {
                    warn!(
                        "attempt {}/{} failed: {error}",
                        transient_attempts + 1,
                        self.retry.max_attempts
                    );
                    last_error = Some(error);

                    transient_attempts += 1;
                    if transient_attempts >= self.retry.max_attempts {
                        break;
                    }

                    let delay = self.retry.backoff_delay(transient_attempts - 1);
                    debug!("backing off {:.1}s before retry", delay.as_secs_f64());
                    sleep(delay).await;
                }
                ErrorClass::Fatal => {
                    warn!("fatal failure, not retrying: {error}");
                    return Err(error);
                }
            }
        }

        Err(Error::RetriesExhausted {
            attempts: total_failures,
            last_error: last_error.map_or_else(|| "unknown".to_owned(), |error| error.to_string()),
        })
    }

    /// Current pool cooldown snapshot.
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.pool.status()
    }

    /// Shared key pool handle.
    pub fn pool(&self) -> &Arc<KeyPool> {
        &self.pool
    }
}
