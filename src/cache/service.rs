// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Two-tier response cache used by the search server

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::memory::MemoryCache;
use super::stats::StatsTracker;
use super::storage::{key_hash, FileSystemStorage};
use crate::api::{CacheStats, HealthChecks, HealthReport, OptimizeReport, PreloadReport, SizeInfo};
use crate::config::CacheConfig;
use crate::news::NewsSource;
use crate::{DatavaultError, Result};

/// Cache type for search and headline responses
pub const SEARCH: &str = "search";

/// Cache type for top headline responses
pub const HEADLINES: &str = "headlines";

pub struct CacheService {
    config: CacheConfig,
    memory: Mutex<MemoryCache>,
    storage: FileSystemStorage,
    stats: Mutex<StatsTracker>,
}

impl CacheService {
    pub fn new(config: CacheConfig) -> Self {
        let memory = MemoryCache::new(config.memory_capacity, config.memory_ttl());
        let storage = FileSystemStorage::new(config.base_dir.clone());
        info!("Cache initialized at {:?}", config.base_dir);
        Self {
            config,
            memory: Mutex::new(memory),
            storage,
            stats: Mutex::new(StatsTracker::new()),
        }
    }

    fn memory(&self) -> MutexGuard<'_, MemoryCache> {
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tracker(&self) -> MutexGuard<'_, StatsTracker> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn memory_key(key: &str, cache_type: &str) -> String {
        format!("{}:{}", cache_type, key_hash(key))
    }

    /// Look a key up in memory, then on disk; a disk hit warms memory
    pub async fn get(&self, key: &str, cache_type: &str) -> Option<Value> {
        let start = Instant::now();
        let memory_key = Self::memory_key(key, cache_type);

        let cached = self.memory().get(&memory_key);
        if let Some(value) = cached {
            debug!("Memory cache hit for: {}", key);
            self.tracker().record_hit(start.elapsed());
            return Some(value);
        }

        match self.storage.read(key, cache_type).await {
            Ok(Some(entry)) => {
                debug!("File cache hit for: {}", key);
                self.memory().insert(memory_key, entry.response.clone());
                self.tracker().record_hit(start.elapsed());
                Some(entry.response)
            }
            Ok(None) => {
                debug!("Cache miss for: {}", key);
                self.tracker().record_miss(start.elapsed());
                None
            }
            Err(e) => {
                warn!("Cache read error for {}: {}", key, e);
                self.tracker().record_error();
                None
            }
        }
    }

    /// Typed lookup; an entry that no longer deserializes counts as absent
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str, cache_type: &str) -> Option<T> {
        let value = self.get(key, cache_type).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!("Discarding malformed cache entry for {}: {}", key, e);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, cache_type: &str, value: Value) -> Result<()> {
        let result = self.storage.write(key, cache_type, &value).await;
        self.memory().insert(Self::memory_key(key, cache_type), value);
        if result.is_err() {
            self.tracker().record_error();
        } else {
            debug!("Cached data for: {}", key);
        }
        result
    }

    pub async fn set_as<T: Serialize>(&self, key: &str, cache_type: &str, value: &T) -> Result<()> {
        self.set(key, cache_type, serde_json::to_value(value)?).await
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.tracker().snapshot();
        let memory = self.memory();
        stats.memory_cache_size = memory.len();
        stats.memory_cache_max = memory.capacity();
        stats.memory_cache_ttl = memory.ttl().as_secs();
        stats
    }

    pub async fn health_check(&self) -> HealthChecks {
        let memory_ok = !self.memory.is_poisoned();
        let storage_ok = self.storage.probe().await;
        HealthChecks {
            memory_ok,
            storage_ok,
            all_systems_ok: memory_ok && storage_ok,
        }
    }

    pub async fn health_report(&self) -> HealthReport {
        let health = self.health_check().await;
        let status = if health.all_systems_ok { "healthy" } else { "degraded" };
        HealthReport {
            stats: self.stats(),
            health,
            status: status.to_string(),
        }
    }

    pub async fn size_info(&self) -> SizeInfo {
        let (current_size, items_count) = self.storage.usage().await;
        let max_size = self.config.max_size_bytes;
        let usage_percent = if max_size == 0 {
            0.0
        } else {
            (current_size as f64 / max_size as f64 * 10_000.0).round() / 100.0
        };
        SizeInfo {
            current_size,
            max_size,
            usage_percent,
            items_count,
        }
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.memory().clear();
        self.storage.clear().await?;
        info!("Cache cleared");
        Ok(())
    }

    /// Drop expired memory entries and disk entries older than `cleanup_days`
    pub async fn optimize(&self) -> OptimizeReport {
        let start = Instant::now();
        let purged = self.memory().purge_expired() as u64;
        let max_age = Duration::from_secs(self.config.cleanup_days.saturating_mul(24 * 60 * 60));
        let (removed, space_saved) = self.storage.remove_older_than(max_age).await;

        let report = OptimizeReport {
            optimized_entries: purged + removed,
            space_saved,
            duration: start.elapsed().as_secs_f64(),
        };
        info!(
            "Cache optimized: {} entries, {} bytes reclaimed",
            report.optimized_entries, report.space_saved
        );
        report
    }

    /// Fetch and cache each query concurrently
    pub async fn preload(&self, queries: &[String], source: &dyn NewsSource) -> PreloadReport {
        let start = Instant::now();

        let outcomes = join_all(queries.iter().map(|query| async move {
            let result: Result<()> = async {
                let response = source.everything(query).await?;
                self.set_as(query, SEARCH, &response).await
            }
            .await;
            (query.clone(), result)
        }))
        .await;

        let mut report = PreloadReport::default();
        for (query, result) in outcomes {
            match result {
                Ok(()) => report.preloaded.push(query),
                Err(e) => {
                    warn!("Preload failed for {}: {}", query, e);
                    report.failed.push(query);
                }
            }
        }
        report.duration = start.elapsed().as_secs_f64();
        info!("Preloaded {} searches ({} failed)", report.preloaded.len(), report.failed.len());
        report
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

/// Reject a cache directory that cannot be used at all
pub async fn open(config: CacheConfig) -> Result<CacheService> {
    tokio::fs::create_dir_all(&config.base_dir)
        .await
        .map_err(|e| DatavaultError::Cache(format!("Cannot create {:?}: {}", config.base_dir, e)))?;
    Ok(CacheService::new(config))
}
