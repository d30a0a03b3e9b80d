use std::time::Duration;

use crate::config::RATE_LIMIT_BUFFER;

/// Padding added on top of the reset time for proactive pauses.
const PAUSE_PAD: u64 = 5;
/// Padding added when the API answered with an explicit 403/429.
const COOLDOWN_PAD: u64 = 10;

/// Latest rate-limit snapshot taken from response headers.
///
/// Values are advisory: a missing or stale snapshot only affects pacing,
/// never correctness. Callers do the actual sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateBudget {
    remaining: Option<u32>,
    reset_epoch: Option<u64>,
}

impl RateBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot. `None` means the header was absent or unparsable
    /// and leaves the previous value in place — no information is not zero
    /// quota.
    pub fn observe(&mut self, remaining: Option<u32>, reset_epoch: Option<u64>) {
        if remaining.is_some() {
            self.remaining = remaining;
        }
        if reset_epoch.is_some() {
            self.reset_epoch = reset_epoch;
        }
    }

    /// How long to wait before the next call, if the budget is running low
    /// and the window reset is still ahead of us.
    pub fn should_pause(&self, now_epoch: u64) -> Option<Duration> {
        let remaining = self.remaining?;
        let reset = self.reset_epoch?;
        if remaining >= RATE_LIMIT_BUFFER {
            return None;
        }
        if reset <= now_epoch {
            return None;
        }
        Some(Duration::from_secs(reset - now_epoch + PAUSE_PAD))
    }

    /// Sleep time after an explicit rate-limit response (403/429):
    /// `reset - now + 10s`, floored at zero.
    pub fn cooldown(&self, now_epoch: u64) -> Duration {
        match self.reset_epoch {
            Some(reset) => Duration::from_secs((reset + COOLDOWN_PAD).saturating_sub(now_epoch)),
            None => Duration::ZERO,
        }
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_when_budget_low() {
        let mut budget = RateBudget::new();
        budget.observe(Some(5), Some(1_020));
        // reset is 20s away, plus the 5s pad
        assert_eq!(budget.should_pause(1_000), Some(Duration::from_secs(25)));
    }

    #[test]
    fn test_no_pause_with_plenty_remaining() {
        let mut budget = RateBudget::new();
        budget.observe(Some(500), Some(1_020));
        assert_eq!(budget.should_pause(1_000), None);
    }

    #[test]
    fn test_no_pause_without_snapshot() {
        let budget = RateBudget::new();
        assert_eq!(budget.should_pause(1_000), None);
    }

    #[test]
    fn test_no_pause_when_reset_passed() {
        let mut budget = RateBudget::new();
        budget.observe(Some(5), Some(900));
        assert_eq!(budget.should_pause(1_000), None);
    }

    #[test]
    fn test_observe_keeps_prior_values_on_missing_headers() {
        let mut budget = RateBudget::new();
        budget.observe(Some(50), Some(1_500));
        budget.observe(None, None);
        assert_eq!(budget.remaining(), Some(50));
        assert_eq!(budget.should_pause(1_000), Some(Duration::from_secs(505)));
    }

    #[test]
    fn test_cooldown_from_reset_header() {
        let mut budget = RateBudget::new();
        budget.observe(Some(0), Some(1_030));
        assert_eq!(budget.cooldown(1_000), Duration::from_secs(40));
    }

    #[test]
    fn test_cooldown_floors_at_zero() {
        let mut budget = RateBudget::new();
        budget.observe(Some(0), Some(900));
        assert_eq!(budget.cooldown(1_000), Duration::ZERO);
        assert_eq!(RateBudget::new().cooldown(1_000), Duration::ZERO);
    }
}
