//! Retry and backoff utilities for outbound identification requests.
//!
//! Only transport failures are retried. HTTP error statuses (including 401)
//! are returned to the caller on the first attempt.

use std::time::Duration;

/// Default number of retry attempts for transient network errors.
pub const DEFAULT_NETWORK_RETRIES: u32 = 2;

/// Base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay cap for exponential backoff.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Determine if a reqwest error is a transient network error that should be retried.
///
/// Connection failures and timeouts qualify. Errors carrying an HTTP status
/// or a decode failure do not.
pub fn is_transient_network_error(error: &reqwest::Error) -> bool {
    if error.status().is_some() {
        return false;
    }
    error.is_connect() || error.is_timeout()
}

/// Calculate exponential backoff delay.
///
/// Uses min(base * 2^attempt + base / 2, max).
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    exponential.saturating_add(base / 2).min(max)
}
