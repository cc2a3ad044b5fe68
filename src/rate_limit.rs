use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::lead::FunnelKind;

/// Per-IP-per-funnel lead submission limiter using a fixed window.
pub struct LeadRateLimiter {
    /// (funnel, ip) -> (count, window_start)
    entries: DashMap<(FunnelKind, IpAddr), (u32, Instant)>,
}

impl Default for LeadRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LeadRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a submission is allowed. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, funnel: FunnelKind, ip: IpAddr, limit: u32, window_secs: u64) -> Result<(), u64> {
        let window = Duration::from_secs(window_secs);
        let now = Instant::now();

        let mut entry = self.entries.entry((funnel, ip)).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(window_secs.saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
