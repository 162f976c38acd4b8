use std::time::Duration;

use uuid::Uuid;

/// Exponential backoff between retry attempts: the base delay doubles per
/// attempt up to `cap`, plus a jitter offset bounded by the base delay so
/// concurrent retries against the same provider spread out.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    /// Delay before the next try after `attempt` failed attempts (1-based).
    /// Pure in (attempt, jitter_unit); callers feed a random unit in [0, 1)
    /// so tests can pin the jitter.
    pub fn delay_for_attempt(&self, attempt: u32, jitter_unit: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let doubled = self.base.saturating_mul(1u32 << exponent);
        let capped = doubled.min(self.cap);
        let jitter = self.base.mul_f64(jitter_unit.clamp(0.0, 1.0));
        capped + jitter
    }
}

/// Uniform-ish unit in [0, 1) derived from uuid entropy, which keeps a
/// dedicated rng crate out of the tree.
pub fn jitter_unit() -> f64 {
    (Uuid::new_v4().as_u128() & 0xFFFF) as f64 / 65536.0
}
