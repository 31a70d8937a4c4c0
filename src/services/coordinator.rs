//! Request coordinator.
//!
//! Wraps any AI-call future with (a) in-flight deduplication and (b) a
//! bounded retry policy. An explicit instance owns the in-flight map rather
//! than a module-level singleton, so its lifetime is visible and it can be
//! tested in isolation. Constructed once per process and shared behind the
//! facade.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::{FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

type SharedCall = Shared<Pin<Box<dyn Future<Output = std::result::Result<String, Arc<AppError>>> + Send>>>;

/// Identity of one AI request for deduplication purposes.
#[derive(Debug, Clone)]
pub struct RequestKey {
    pub content: String,
    pub model: String,
    pub settings_fingerprint: String,
}

impl RequestKey {
    pub fn new(
        content: impl Into<String>,
        model: impl Into<String>,
        settings_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            settings_fingerprint: settings_fingerprint.into(),
        }
    }

    /// Cache key: FNV-1a over the content prefix, model, settings and the
    /// time bucket, with content length and model-name length mixed in as
    /// extra entropy, suffixed with the bucket for uniqueness across
    /// buckets.
    fn fingerprint(&self, prefix_len: usize, bucket_secs: i64) -> String {
        let prefix: String = self.content.chars().take(prefix_len).collect();
        let bucket = chrono::Utc::now().timestamp() / bucket_secs.max(1);

        let mut hash = fnv1a(prefix.as_bytes());
        hash = fnv1a_continue(hash, self.model.as_bytes());
        hash = fnv1a_continue(hash, self.settings_fingerprint.as_bytes());
        hash = fnv1a_continue(hash, bucket.to_string().as_bytes());
        hash ^= (self.content.len() as u64).wrapping_mul(0x9E37_79B9);
        hash ^= (self.model.len() as u64).rotate_left(32);

        format!("{:016x}-{}", hash, bucket)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    fnv1a_continue(FNV_OFFSET, bytes)
}

fn fnv1a_continue(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Retry policy parameters (see `Config` for the defaults and their caveat).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step_ms: u64,
}

/// Deduplicating, retrying wrapper around AI calls.
pub struct RequestCoordinator {
    in_flight: Arc<Mutex<HashMap<String, SharedCall>>>,
    retry: RetryPolicy,
    dedup_prefix_len: usize,
    dedup_bucket_secs: i64,
}

impl RequestCoordinator {
    pub fn new(config: &Config) -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            retry: RetryPolicy {
                max_attempts: config.max_retry_attempts.max(1),
                backoff_step_ms: config.retry_backoff_ms,
            },
            dedup_prefix_len: config.dedup_prefix_len,
            dedup_bucket_secs: config.dedup_bucket_secs,
        }
    }

    /// Execute an AI call under deduplication and retry.
    ///
    /// Concurrent calls with an identical key within the same time bucket
    /// coalesce onto one underlying call (rapid double-submits). The call
    /// itself runs on its own task: abandoned awaiters (timeout wrappers,
    /// aborted callers) never stall it, it always runs to completion and
    /// removes its in-flight entry once it settles, success or failure.
    pub async fn execute<F, Fut>(&self, key: RequestKey, call: F) -> Result<String>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let cache_key = key.fingerprint(self.dedup_prefix_len, self.dedup_bucket_secs);

        let shared = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(&cache_key) {
                debug!(key = %cache_key, "coalescing onto in-flight request");
                existing.clone()
            } else {
                let retry = self.retry.clone();
                let map = Arc::clone(&self.in_flight);
                let entry_key = cache_key.clone();
                let handle = tokio::spawn(async move {
                    let result = run_with_retry(&retry, call).await.map_err(Arc::new);
                    // The task drains its own entry, succeed or fail.
                    map.lock().await.remove(&entry_key);
                    result
                });
                let fut: SharedCall = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(join_error) => Err(Arc::new(AppError::Other(format!(
                            "in-flight call task failed: {}",
                            join_error
                        )))),
                    }
                }
                .boxed()
                .shared();
                in_flight.insert(cache_key.clone(), fut.clone());
                fut
            }
        };

        shared.await.map_err(AppError::Coalesced)
    }

    /// How many requests are currently in flight (test observability).
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

/// Bounded retry with linear backoff.
///
/// Terminal errors (quota, invalid key) and content errors (malformed or
/// empty response) surface immediately; only transient transport errors go
/// around the loop again.
async fn run_with_retry<F, Fut>(policy: &RetryPolicy, call: F) -> Result<String>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_terminal() => {
                warn!(attempt, "terminal provider error, not retrying: {}", error);
                return Err(error);
            }
            Err(error) if !error.is_retryable() => {
                // Retrying will not fix a structurally bad prompt/response
                // pairing within the same call.
                warn!(attempt, "non-retryable error: {}", error);
                return Err(error);
            }
            Err(error) => {
                warn!(
                    attempt,
                    max = policy.max_attempts,
                    "transient provider error: {}",
                    error
                );
                last_error = Some(error);
                if attempt < policy.max_attempts {
                    let delay = attempt as u64 * policy.backoff_step_ms;
                    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::Other("retry loop exhausted".to_string())))
}

/// Partial-success policy: fewer questions than requested is a warning, not
/// an error, and is never topped up with another call.
pub fn log_partial_result(requested: u32, received: usize) {
    if (received as u32) < requested {
        warn!(
            requested,
            received, "fewer questions than requested, returning partial result"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn test_config() -> Config {
        Config {
            retry_backoff_ms: 1,
            ..Config::default()
        }
    }

    fn key(content: &str) -> RequestKey {
        RequestKey::new(content, "test-model", "fp")
    }

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        let a = key("same content").fingerprint(2000, 60);
        let b = key("same content").fingerprint(2000, 60);
        let c = key("different content").fingerprint(2000, 60);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fingerprint_depends_on_model_and_settings() {
        let base = key("content").fingerprint(2000, 60);
        let other_model =
            RequestKey::new("content", "other-model", "fp").fingerprint(2000, 60);
        let other_settings =
            RequestKey::new("content", "test-model", "fp2").fingerprint(2000, 60);
        assert_ne!(base, other_model);
        assert_ne!(base, other_settings);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_coalesce() {
        let coordinator = Arc::new(RequestCoordinator::new(&test_config()));
        let calls = Arc::new(AtomicU32::new(0));

        let make = |coordinator: Arc<RequestCoordinator>, calls: Arc<AtomicU32>| async move {
            coordinator
                .execute(key("identical"), move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                        Ok("response".to_string())
                    }
                })
                .await
        };

        let (first, second) = tokio::join!(
            make(Arc::clone(&coordinator), Arc::clone(&calls)),
            make(Arc::clone(&coordinator), Arc::clone(&calls))
        );

        assert_eq!(first.unwrap(), "response");
        assert_eq!(second.unwrap(), "response");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn abandoned_caller_does_not_leak_the_entry() {
        let coordinator = Arc::new(RequestCoordinator::new(&test_config()));
        let completions = Arc::new(AtomicU32::new(0));

        let caller = {
            let coordinator = Arc::clone(&coordinator);
            let completions = Arc::clone(&completions);
            tokio::spawn(async move {
                coordinator
                    .execute(key("abandoned request"), move || {
                        let completions = Arc::clone(&completions);
                        async move {
                            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                            completions.fetch_add(1, Ordering::SeqCst);
                            Ok("finished anyway".to_string())
                        }
                    })
                    .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(coordinator.in_flight_count().await, 1);
        caller.abort();

        // The underlying call keeps running without any awaiter and drains
        // its own entry on completion.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.in_flight_count().await, 0);
    }

    #[tokio::test]
    async fn different_content_does_not_coalesce() {
        let coordinator = Arc::new(RequestCoordinator::new(&test_config()));
        let calls = Arc::new(AtomicU32::new(0));

        for content in ["first request", "second request"] {
            let calls = Arc::clone(&calls);
            coordinator
                .execute(key(content), move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok("ok".to_string())
                    }
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn terminal_error_is_not_retried() {
        let coordinator = RequestCoordinator::new(&test_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = coordinator
            .execute(key("quota case"), move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::provider_message("insufficient_quota"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_error_retries_then_succeeds() {
        let coordinator = RequestCoordinator::new(&test_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = coordinator
            .execute(key("timeout case"), move || {
                let counter = Arc::clone(&counter);
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt <= 2 {
                        Err(AppError::provider_message("ETIMEDOUT"))
                    } else {
                        Ok("finally".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "finally");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn content_error_is_not_retried() {
        let coordinator = RequestCoordinator::new(&test_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = coordinator
            .execute(key("malformed case"), move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::provider_message("response was not JSON at all"))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let coordinator = RequestCoordinator::new(&test_config());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = coordinator
            .execute(key("always down"), move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::provider_message("ECONNRESET"))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("ECONNRESET"), "{}", message);
    }
}
