// ABOUTME: Retry wrapper that masks transient busy/locked failures with linear backoff.
// ABOUTME: Every storage operation runs through here; non-contention errors propagate immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Configuration for contention retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Execute a storage operation, retrying on contention.
///
/// Returns the first success, the first non-contention error, or a
/// `Contention` error carrying the number of attempts made.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        "storage operation '{}' succeeded on attempt {}/{}",
                        operation_name, attempt, max_attempts
                    );
                }
                return Ok(value);
            }
            Err(StoreError::Contention { source, .. }) => {
                if attempt >= max_attempts {
                    warn!(
                        "storage operation '{}' still busy after {} attempts: {}",
                        operation_name, attempt, source
                    );
                    return Err(StoreError::Contention {
                        attempts: attempt,
                        source,
                    });
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    "storage operation '{}' busy on attempt {}/{}, retrying in {:?}: {}",
                    operation_name, attempt, max_attempts, delay, source
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use rusqlite::ffi;

    use super::*;

    fn busy() -> StoreError {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        )
        .into()
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delay_is_linear_in_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn retries_contention_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = with_retry(&fast_policy(), "test", || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(busy())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = with_retry(&fast_policy(), "test", || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(busy())
            }
        })
        .await;

        match result {
            Err(StoreError::Contention { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected contention error, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_other_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = with_retry(&fast_policy(), "test", || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::from(rusqlite::Error::QueryReturnedNoRows))
            }
        })
        .await;

        assert!(matches!(result, Err(StoreError::Sqlite(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
