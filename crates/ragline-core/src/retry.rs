//! Timeouts and retry for remote calls.
//!
//! Every remote call runs under a time budget. Retries are only applied by
//! [`CallPolicy::retrying`], which callers use for side-effect-free reads
//! (embedding and search). Generation and index replacement go through
//! [`CallPolicy::once`].

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::defaults;
use crate::error::{Error, Result};

/// Time budget and retry settings for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPolicy {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Retries on top of the first attempt (retrying calls only).
    pub max_retries: u32,
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::TIMEOUT_SECS,
            max_retries: defaults::MAX_RETRIES,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
        }
    }
}

impl CallPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(10);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Run a single attempt under the timeout. Never retries.
    pub async fn once<T, Fut>(&self, operation: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                operation: operation.to_string(),
                seconds: self.timeout_secs,
            }),
        }
    }

    /// Run an idempotent call, retrying retryable failures with backoff.
    pub async fn retrying<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.once(operation, call()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        op = operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying remote call"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(max_retries: u32) -> CallPolicy {
        CallPolicy {
            timeout_secs: 5,
            max_retries,
            base_delay_ms: 1,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = CallPolicy {
            base_delay_ms: 100,
            ..Default::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_retrying_recovers_from_transient_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = fast_policy(2)
            .retrying("embed", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Error::Request("connection reset".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retrying_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<()> = fast_policy(2)
            .retrying("search", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Request("503".to_string()))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<()> = fast_policy(5)
            .retrying("search", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Search("invalid filter".to_string()))
                }
            })
            .await;
        assert!(matches!(result, Err(Error::Search(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_times_out() {
        let policy = CallPolicy {
            timeout_secs: 1,
            max_retries: 0,
            base_delay_ms: 1,
        };
        let result: Result<()> = policy
            .once("complete", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        match result {
            Err(Error::Timeout { operation, seconds }) => {
                assert_eq!(operation, "complete");
                assert_eq!(seconds, 1);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
