// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wire types shared by the search/cache server and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// A logged search, as accepted by `POST /api/log_search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchLog {
    pub user_id: String,
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success".to_string(), message: None }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self { status: "success".to_string(), message: Some(message.into()) }
    }
}

/// `{"status": "success", "data": ...}` wrapper used by the cache endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self { status: "success".to_string(), data }
    }
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Response-cache performance counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub hit_ratio_percent: f64,
    pub avg_response_ms: f64,
    #[serde(default)]
    pub memory_cache_size: usize,
    #[serde(default)]
    pub memory_cache_max: usize,
    #[serde(default)]
    pub memory_cache_ttl: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub memory_ok: bool,
    pub storage_ok: bool,
    pub all_systems_ok: bool,
}

/// Payload of `GET /api/cache/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub stats: CacheStats,
    pub health: HealthChecks,
    pub status: String,
}

/// Payload of `GET /api/cache/size`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub current_size: u64,
    pub max_size: u64,
    pub usage_percent: f64,
    pub items_count: u64,
}

/// Payload of `POST /api/cache/optimize`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub optimized_entries: u64,
    pub space_saved: u64,
    /// Seconds
    pub duration: f64,
}

/// Payload of `POST /api/cache/preload`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreloadReport {
    pub preloaded: Vec<String>,
    pub failed: Vec<String>,
    /// Seconds
    pub duration: f64,
}
