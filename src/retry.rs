//! Retry with exponential backoff for transient bootstrap failures.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, warn};

/// Retry settings for a backend's bootstrap hook.
///
/// Deserialized from the `retry` section of a profile; every field is
/// optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first (0 behaves like 1).
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for the delay between retries, in milliseconds.
    pub max_delay_ms: u64,
    /// Factor applied to the delay after each retry.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Creates a config with `attempts` attempts and no delay between them.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Creates a config that never retries.
    pub fn no_retry() -> Self {
        Self::immediate(1)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the delay before the first retry, capped at `max_delay`.
    fn first_delay(&self) -> Duration {
        self.initial_delay().min(self.max_delay())
    }

    /// Returns the delay after `delay`, capped at `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        };
        let next = (delay.as_secs_f64() * multiplier).min(self.max_delay().as_secs_f64());
        Duration::from_secs_f64(next)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error,
/// or runs out of attempts.
///
/// Returns the final outcome together with the number of attempts made.
///
/// # Arguments
/// * `config` - Retry settings
/// * `operation_name` - Name for logging purposes
/// * `should_retry` - Decides whether an error is transient
/// * `operation` - The operation to run
pub fn retry_with_backoff<T, E, F, P>(
    config: &RetryConfig,
    operation_name: &str,
    should_retry: P,
    mut operation: F,
) -> (Result<T, E>, u32)
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.first_delay();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation() {
            Ok(value) => return (Ok(value), attempt),
            Err(e) if !should_retry(&e) => return (Err(e), attempt),
            Err(e) if attempt >= max_attempts => {
                error!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "operation failed after max retries"
                );
                return (Err(e), attempt);
            }
            Err(e) => {
                warn!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                delay = config.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_succeeds_immediately() {
        let (result, attempts) =
            retry_with_backoff(&RetryConfig::immediate(3), "op", |_: &String| true, || Ok(42));
        assert_eq!(result, Ok(42));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_succeeds_after_failures() {
        let calls = Cell::new(0);
        let (result, attempts) =
            retry_with_backoff(&RetryConfig::immediate(5), "op", |_: &String| true, || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 { Err("transient".to_string()) } else { Ok("done") }
            });
        assert_eq!(result, Ok("done"));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let (result, attempts): (Result<(), String>, u32) =
            retry_with_backoff(&RetryConfig::immediate(3), "op", |_| true, || {
                Err("always".to_string())
            });
        assert_eq!(result, Err("always".to_string()));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_does_not_retry_permanent_errors() {
        let (result, attempts): (Result<(), String>, u32) =
            retry_with_backoff(&RetryConfig::immediate(5), "op", |_| false, || {
                Err("permanent".to_string())
            });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_zero_attempts_runs_once() {
        let (_, attempts): (Result<(), String>, u32) =
            retry_with_backoff(&RetryConfig::immediate(0), "op", |_| true, || Err("x".to_string()));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_next_delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay_ms: 100,
            max_delay_ms: 250,
            backoff_multiplier: 2.0,
        };
        let d1 = config.next_delay(config.initial_delay());
        assert_eq!(d1, Duration::from_millis(200));
        assert_eq!(config.next_delay(d1), Duration::from_millis(250));
    }

    #[test]
    fn test_first_delay_is_capped() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_delay_ms: 10_000,
            max_delay_ms: 1,
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.first_delay(), Duration::from_millis(1));

        let started = std::time::Instant::now();
        let (_, attempts): (Result<(), String>, u32) =
            retry_with_backoff(&config, "op", |_| true, || Err("x".to_string()));
        assert_eq!(attempts, 2);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_partial_section() {
        let config: RetryConfig = serde_yaml::from_str("max_attempts: 5\n").unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.initial_delay_ms, 100);
    }
}
