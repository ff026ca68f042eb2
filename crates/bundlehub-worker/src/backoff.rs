//! Retry backoff policy.

use std::time::Duration;

use rand::Rng;

/// Full-jitter exponential backoff.
///
/// Draws uniformly from `[0, min(max, base * 2^(attempt - 1))]` so that
/// a herd of failed jobs does not retry in lockstep. `attempt` is the
/// 1-based count of attempts already performed.
pub fn full_jitter(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let ceiling = base
        .saturating_mul(2u32.saturating_pow(exponent))
        .min(max);
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    let millis = rand::rng().random_range(0..=ceiling.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Uniform draw from the configured simulated-processing window.
///
/// A degenerate window (`min >= max`) collapses to `min`, which is what
/// deterministic tests rely on.
pub fn sample_delay(min: Duration, max: Duration) -> Duration {
    if min >= max {
        return min;
    }
    let millis = rand::rng().random_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}
