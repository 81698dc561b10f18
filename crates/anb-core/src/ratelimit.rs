//! Sliding-window relay counter.
//!
//! Counts relays per sender within a trailing window. The policy gate
//! compares the count against the configured maximum; a hit is recorded only
//! after a relay actually went out, so denied attempts do not consume quota.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::domain::UserId;

#[derive(Debug, Default)]
pub struct RateLimiter {
    sent: HashMap<UserId, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sender: UserId) {
        self.record_at(sender, Instant::now());
    }

    pub fn record_at(&mut self, sender: UserId, now: Instant) {
        self.sent.entry(sender).or_default().push_back(now);
    }

    pub fn count_within(&mut self, sender: UserId, window: Duration) -> u32 {
        self.count_within_at(sender, window, Instant::now())
    }

    /// Entries older than `window` are pruned as a side effect, so memory is
    /// bounded by the per-sender quota rather than total history.
    pub fn count_within_at(&mut self, sender: UserId, window: Duration, now: Instant) -> u32 {
        let Some(times) = self.sent.get_mut(&sender) else {
            return 0;
        };

        let cutoff = now.checked_sub(window);
        while let (Some(&front), Some(cutoff)) = (times.front(), cutoff) {
            if front < cutoff {
                times.pop_front();
            } else {
                break;
            }
        }

        if times.is_empty() {
            self.sent.remove(&sender);
            return 0;
        }

        times.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(3600);

    #[test]
    fn counts_are_monotonic_within_window() {
        let start = Instant::now();
        let mut rl = RateLimiter::new();
        let s = UserId(1);

        assert_eq!(rl.count_within_at(s, WINDOW, start), 0);

        for i in 1..=10u32 {
            rl.record_at(s, start + Duration::from_secs(i as u64));
            assert_eq!(
                rl.count_within_at(s, WINDOW, start + Duration::from_secs(i as u64)),
                i
            );
        }
    }

    #[test]
    fn window_slides_and_quota_recovers() {
        let start = Instant::now();
        let mut rl = RateLimiter::new();
        let s = UserId(1);

        rl.record_at(s, start);
        rl.record_at(s, start + Duration::from_secs(1800));

        // Both within the trailing hour.
        assert_eq!(rl.count_within_at(s, WINDOW, start + Duration::from_secs(1800)), 2);

        // First entry slides out just past its hour.
        let later = start + Duration::from_secs(3601);
        assert_eq!(rl.count_within_at(s, WINDOW, later), 1);

        // Everything expired.
        let much_later = start + Duration::from_secs(7200);
        assert_eq!(rl.count_within_at(s, WINDOW, much_later), 0);
    }

    #[test]
    fn senders_are_counted_independently() {
        let start = Instant::now();
        let mut rl = RateLimiter::new();

        rl.record_at(UserId(1), start);
        rl.record_at(UserId(1), start);
        rl.record_at(UserId(2), start);

        assert_eq!(rl.count_within_at(UserId(1), WINDOW, start), 2);
        assert_eq!(rl.count_within_at(UserId(2), WINDOW, start), 1);
        assert_eq!(rl.count_within_at(UserId(3), WINDOW, start), 0);
    }
}
