// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cache monitor: polls the cache endpoints and keeps a rolling chart series

pub mod client;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{CacheStats, HealthReport, SizeInfo};
pub use client::CacheMonitorClient;

/// One poll of the three read endpoints; each part fails independently
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub taken_at: DateTime<Utc>,
    pub stats: Result<CacheStats, String>,
    pub health: Result<HealthReport, String>,
    pub size: Result<SizeInfo, String>,
}

impl MonitorSnapshot {
    pub fn is_fully_ok(&self) -> bool {
        self.stats.is_ok() && self.health.is_ok() && self.size.is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSample {
    pub at: DateTime<Utc>,
    pub hit_ratio_percent: f64,
    pub avg_response_ms: f64,
}

/// Fixed-length window of the most recent samples
#[derive(Debug, Clone)]
pub struct ChartSeries {
    capacity: usize,
    samples: VecDeque<ChartSample>,
}

impl ChartSeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: ChartSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn samples(&self) -> impl Iterator<Item = &ChartSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub struct Monitor {
    client: CacheMonitorClient,
    interval: Duration,
    series: ChartSeries,
}

impl Monitor {
    pub fn new(client: CacheMonitorClient, interval: Duration, chart_points: usize) -> Self {
        Self {
            client,
            interval,
            series: ChartSeries::new(chart_points),
        }
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    /// Fetch stats, health and size concurrently
    pub async fn snapshot(&self) -> MonitorSnapshot {
        let (stats, health, size) = tokio::join!(
            self.client.stats(),
            self.client.health(),
            self.client.size(),
        );

        MonitorSnapshot {
            taken_at: Utc::now(),
            stats: stats.map_err(|e| e.to_string()),
            health: health.map_err(|e| e.to_string()),
            size: size.map_err(|e| e.to_string()),
        }
    }

    /// Take one snapshot and record it in the chart series
    pub async fn tick(&mut self) -> MonitorSnapshot {
        let snapshot = self.snapshot().await;
        match &snapshot.stats {
            Ok(stats) => self.series.push(ChartSample {
                at: snapshot.taken_at,
                hit_ratio_percent: stats.hit_ratio_percent,
                avg_response_ms: stats.avg_response_ms,
            }),
            Err(e) => warn!("Failed to fetch cache stats: {}", e),
        }
        snapshot
    }

    /// Poll until `shutdown` flips to true
    ///
    /// Each tick is awaited before the next one starts, so slow responses
    /// delay the schedule instead of piling up.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_tick: F)
    where
        F: FnMut(&MonitorSnapshot, &ChartSeries),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Polling cache every {:?}", self.interval);

        loop {
            tokio::select! {
                // Shutdown wins over a tick that is already due
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let snapshot = self.tick().await;
                    debug!("Monitor tick, ok = {}", snapshot.is_fully_ok());
                    on_tick(&snapshot, &self.series);
                }
            }
        }
        info!("Monitor stopped");
    }
}

/// Plain-text rendering for terminals
pub fn render_text(snapshot: &MonitorSnapshot, series: &ChartSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cache monitor @ {}", snapshot.taken_at.format("%H:%M:%S"));

    match &snapshot.stats {
        Ok(s) => {
            let _ = writeln!(
                out,
                "  Hit ratio: {:.2}%  Requests: {}  Hits: {}  Misses: {}  Errors: {}",
                s.hit_ratio_percent, s.total_requests, s.hits, s.misses, s.errors
            );
            let _ = writeln!(
                out,
                "  Avg response: {:.2} ms  Memory: {}/{}  Uptime: {}s",
                s.avg_response_ms, s.memory_cache_size, s.memory_cache_max, s.uptime_seconds
            );
        }
        Err(e) => {
            let _ = writeln!(out, "  Stats unavailable: {}", e);
        }
    }

    match &snapshot.health {
        Ok(h) => {
            let _ = writeln!(
                out,
                "  Health: {} (memory {}, storage {})",
                h.status,
                if h.health.memory_ok { "ok" } else { "failing" },
                if h.health.storage_ok { "ok" } else { "failing" }
            );
        }
        Err(e) => {
            let _ = writeln!(out, "  Health unavailable: {}", e);
        }
    }

    match &snapshot.size {
        Ok(s) => {
            let _ = writeln!(
                out,
                "  Size: {} / {} bytes ({:.2}%), {} items",
                s.current_size, s.max_size, s.usage_percent, s.items_count
            );
        }
        Err(e) => {
            let _ = writeln!(out, "  Size unavailable: {}", e);
        }
    }

    if !series.is_empty() {
        let spark: String = series.samples().map(|s| spark_char(s.hit_ratio_percent)).collect();
        let _ = writeln!(out, "  Hit ratio trend: {}", spark);
    }

    out
}

fn spark_char(percent: f64) -> char {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let idx = ((percent.clamp(0.0, 100.0) / 100.0) * (BARS.len() - 1) as f64).round() as usize;
    BARS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ratio: f64) -> ChartSample {
        ChartSample {
            at: Utc::now(),
            hit_ratio_percent: ratio,
            avg_response_ms: 1.0,
        }
    }

    #[test]
    fn test_series_rolls() {
        let mut series = ChartSeries::new(3);
        for ratio in [10.0, 20.0, 30.0, 40.0] {
            series.push(sample(ratio));
        }
        let ratios: Vec<_> = series.samples().map(|s| s.hit_ratio_percent).collect();
        assert_eq!(ratios, vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_spark_bounds() {
        assert_eq!(spark_char(0.0), '▁');
        assert_eq!(spark_char(100.0), '█');
        assert_eq!(spark_char(250.0), '█');
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/cache/stats")
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"uptime_seconds":5,"total_requests":4,"hits":3,"misses":1,"errors":0,"hit_ratio_percent":75.0,"avg_response_ms":2.5}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/cache/health")
            .with_status(500)
            .with_body(r#"{"detail":"Cache health check failed"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/api/cache/size")
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"current_size":0,"max_size":10,"usage_percent":0.0,"items_count":0}}"#,
            )
            .create_async()
            .await;

        let client = CacheMonitorClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let mut monitor = Monitor::new(client, Duration::from_secs(5), 20);
        let snapshot = monitor.tick().await;

        assert!(snapshot.stats.is_ok());
        assert!(snapshot.size.is_ok());
        assert!(snapshot.health.unwrap_err().contains("Cache health check failed"));
        assert_eq!(monitor.series().len(), 1);

        let text = render_text(&monitor.snapshot().await, monitor.series());
        assert!(text.contains("Hit ratio: 75.00%"));
        assert!(text.contains("Health unavailable"));
    }

    #[tokio::test]
    async fn test_run_ticks_without_overlap_until_shutdown() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_in_flight = Arc::new(AtomicUsize::new(0));
        let mut server = mockito::Server::new_async().await;
        let (current, peak) = (in_flight.clone(), max_in_flight.clone());
        let stats = server
            .mock("GET", "/api/cache/stats")
            .with_status(200)
            .with_body_from_request(move |_| {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // Slower than the poll interval
                std::thread::sleep(Duration::from_millis(60));
                current.fetch_sub(1, Ordering::SeqCst);
                br#"{"status":"success","data":{"uptime_seconds":1,"total_requests":2,"hits":1,"misses":1,"errors":0,"hit_ratio_percent":50.0,"avg_response_ms":1.0}}"#
                    .to_vec()
            })
            .expect(4)
            .create_async()
            .await;
        server.mock("GET", "/api/cache/health").with_status(503).create_async().await;
        server.mock("GET", "/api/cache/size").with_status(503).create_async().await;

        let client = CacheMonitorClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let mut monitor = Monitor::new(client, Duration::from_millis(10), 3);
        let (tx, rx) = watch::channel(false);

        let mut ticks = 0;
        let mut series_lengths = Vec::new();
        tokio::time::timeout(
            Duration::from_secs(10),
            monitor.run(rx, |snapshot, series| {
                ticks += 1;
                assert!(snapshot.stats.is_ok());
                assert!(snapshot.health.is_err());
                series_lengths.push(series.len());
                if ticks == 4 {
                    let _ = tx.send(true);
                }
            }),
        )
        .await
        .unwrap();

        assert_eq!(ticks, 4);
        assert_eq!(series_lengths, vec![1, 2, 3, 3]);
        assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
        stats.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let client = CacheMonitorClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let mut monitor = Monitor::new(client, Duration::from_secs(3600), 5);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let mut ticks = 0;
        tokio::time::timeout(Duration::from_secs(5), monitor.run(rx, |_, _| ticks += 1))
            .await
            .unwrap();
        assert_eq!(ticks, 0);
    }
}
