use std::time::Duration;

const BASE_DELAY_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 30_000;

/// Capped exponential reconnect delay: 1s, 2s, 4s, ... up to 30s. Attempts are
/// unbounded; only the delay is capped.
#[derive(Debug, Clone, Default)]
pub struct ReconnectBackoff {
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive reconnects scheduled since the last successful open
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next reconnect; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        let delay = BASE_DELAY_MS.saturating_mul(factor).min(MAX_DELAY_MS);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(delay)
    }

    /// Call after a connection opens
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
