//! # LLM Helpers
//!
//! Rate-limit handling shared by every remote call the session makes.
//! The provider answers throttled requests with a message such as
//! "Please try again in 6.512s"; the wait is parsed out of it and the call
//! is retried after sleeping.

use crate::error::BackendError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

/// Wait used when a rate-limit message carries no hint
pub const DEFAULT_WAIT_SECS: f64 = 15.0;

/// How rate-limited calls are retried
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait when neither header nor message says how long
    pub default_wait_secs: f64,
    /// Upper bound for any single wait
    pub max_wait_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            default_wait_secs: DEFAULT_WAIT_SECS,
            max_wait_secs: 120.0,
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn default_wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.default_wait_secs).unwrap_or(Duration::ZERO)
    }

    fn clamp(&self, wait: Duration) -> Duration {
        match Duration::try_from_secs_f64(self.max_wait_secs) {
            Ok(max) => wait.min(max),
            Err(_) => wait,
        }
    }
}

fn wait_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"in (\d+(?:\.\d+)?)s\b").ok())
        .as_ref()
}

/// Extract the suggested wait from a rate-limit message
pub fn parse_wait_time(message: &str, default: Duration) -> Duration {
    wait_pattern()
        .and_then(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(default)
}

/// Run `call`, sleeping and retrying while the service reports a rate limit.
///
/// Only `BackendError::RateLimited` is retried; every other error, and the
/// last rate-limit error once attempts run out, is returned as is.
pub async fn with_rate_limit_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Err(BackendError::RateLimited {
                message,
                retry_after,
            }) if attempt < policy.max_attempts => {
                let wait = retry_after
                    .unwrap_or_else(|| parse_wait_time(&message, policy.default_wait()));
                let wait = policy.clamp(wait);
                tracing::warn!(
                    call = what,
                    attempt,
                    wait_secs = wait.as_secs_f64(),
                    "Rate limited, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_parse_wait_time() {
        let default = Duration::from_secs(15);
        assert_eq!(
            parse_wait_time("Please try again in 6.512s. Visit ...", default),
            Duration::from_secs_f64(6.512)
        );
        assert_eq!(
            parse_wait_time("Please try again in 20s", default),
            Duration::from_secs(20)
        );
        assert_eq!(parse_wait_time("try again in 450ms", default), default);
        assert_eq!(parse_wait_time("slow down", default), default);
    }

    fn throttled() -> BackendError {
        BackendError::RateLimited {
            message: "Please try again in 0.001s".to_string(),
            retry_after: None,
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_rate_limit_retry(&RetryPolicy::default(), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(throttled())
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let result: Result<(), _> = with_rate_limit_retry(&policy, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(throttled())
        })
        .await;
        assert!(matches!(result, Err(BackendError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            with_rate_limit_retry(&RetryPolicy::default(), "test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Http {
                    status: 500,
                    message: "boom".to_string(),
                })
            })
            .await;
        assert!(matches!(result, Err(BackendError::Http { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
