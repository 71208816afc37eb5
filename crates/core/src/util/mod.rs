pub mod retry;

pub use retry::{is_http_retryable, retry_with_backoff, RetryConfig};

/// Clamps a running score into the 0..=100 range reported to consumers.
pub fn clamp_score(score: i32) -> u32 {
    score.clamp(0, 100).unsigned_abs()
}
