// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Hit/miss/latency counters for the response cache

use std::time::{Duration, Instant};

use crate::api::CacheStats;

pub struct StatsTracker {
    hits: u64,
    misses: u64,
    errors: u64,
    total_requests: u64,
    total_response: Duration,
    started: Instant,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            hits: 0,
            misses: 0,
            errors: 0,
            total_requests: 0,
            total_response: Duration::ZERO,
            started: Instant::now(),
        }
    }

    pub fn record_hit(&mut self, elapsed: Duration) {
        self.hits += 1;
        self.record_timing(elapsed);
    }

    pub fn record_miss(&mut self, elapsed: Duration) {
        self.misses += 1;
        self.record_timing(elapsed);
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    fn record_timing(&mut self, elapsed: Duration) {
        self.total_requests += 1;
        self.total_response += elapsed;
    }

    pub fn hit_ratio_percent(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        round2(self.hits as f64 / lookups as f64 * 100.0)
    }

    pub fn avg_response_ms(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        round2(self.total_response.as_secs_f64() * 1000.0 / self.total_requests as f64)
    }

    /// Counters only; the memory tier fields are filled in by the service
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            uptime_seconds: self.started.elapsed().as_secs(),
            total_requests: self.total_requests,
            hits: self.hits,
            misses: self.misses,
            errors: self.errors,
            hit_ratio_percent: self.hit_ratio_percent(),
            avg_response_ms: self.avg_response_ms(),
            ..Default::default()
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_has_zero_ratios() {
        let stats = StatsTracker::new().snapshot();
        assert_eq!(stats.hit_ratio_percent, 0.0);
        assert_eq!(stats.avg_response_ms, 0.0);
    }

    #[test]
    fn test_ratio_and_average() {
        let mut tracker = StatsTracker::new();
        tracker.record_hit(Duration::from_millis(10));
        tracker.record_hit(Duration::from_millis(20));
        tracker.record_miss(Duration::from_millis(30));
        tracker.record_error();

        let stats = tracker.snapshot();
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.hit_ratio_percent, 66.67);
        assert_eq!(stats.avg_response_ms, 20.0);
    }
}
