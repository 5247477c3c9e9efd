// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Filesystem cache tier: one JSON file per key under `{base}/{cache_type}/`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::Result;

/// What is written to disk for each key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub response: Value,
}

/// A file found while scanning the cache directory
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Hash a cache key into a file stem
pub fn key_hash(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

pub struct FileSystemStorage {
    base_dir: PathBuf,
}

impl FileSystemStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, key: &str, cache_type: &str) -> PathBuf {
        self.base_dir.join(cache_type).join(format!("{}.json", key_hash(key)))
    }

    pub async fn read(&self, key: &str, cache_type: &str) -> Result<Option<StoredEntry>> {
        let path = self.entry_path(key, cache_type);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write(&self, key: &str, cache_type: &str, response: &Value) -> Result<()> {
        let path = self.entry_path(key, cache_type);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let entry = StoredEntry {
            query: key.to_string(),
            timestamp: Utc::now(),
            response: response.clone(),
        };
        tokio::fs::write(&path, serde_json::to_vec(&entry)?).await?;
        debug!("Wrote cache file {:?}", path);
        Ok(())
    }

    pub async fn delete(&self, key: &str, cache_type: &str) -> Result<bool> {
        let path = self.entry_path(key, cache_type);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Every cache file, across all cache types
    pub async fn files(&self) -> Vec<StoredFile> {
        let base_dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || scan(&base_dir))
            .await
            .unwrap_or_else(|e| {
                warn!("Cache scan task failed: {}", e);
                Vec::new()
            })
    }

    /// Total bytes on disk and number of files
    pub async fn usage(&self) -> (u64, u64) {
        let files = self.files().await;
        (files.iter().map(|f| f.size).sum(), files.len() as u64)
    }

    /// Remove files older than `max_age`, returning (count, bytes) removed
    pub async fn remove_older_than(&self, max_age: Duration) -> (u64, u64) {
        let base_dir = self.base_dir.clone();
        tokio::task::spawn_blocking(move || remove_stale(&base_dir, max_age))
            .await
            .unwrap_or_else(|e| {
                warn!("Cache cleanup task failed: {}", e);
                (0, 0)
            })
    }

    /// Delete everything under the base directory
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.base_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&self.base_dir).await?;
        Ok(())
    }

    /// Check the base directory accepts writes
    pub async fn probe(&self) -> bool {
        let probe = self.base_dir.join(".probe");
        let result = async {
            tokio::fs::create_dir_all(&self.base_dir).await?;
            tokio::fs::write(&probe, b"ok").await?;
            tokio::fs::remove_file(&probe).await
        }
        .await;
        if let Err(e) = &result {
            warn!("Cache storage probe failed: {}", e);
        }
        result.is_ok()
    }
}

fn scan(base_dir: &Path) -> Vec<StoredFile> {
    let mut files = Vec::new();
    collect_json(base_dir, &mut files);
    files
}

fn remove_stale(base_dir: &Path, max_age: Duration) -> (u64, u64) {
    let cutoff = SystemTime::now().checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0;
    let mut bytes = 0;
    for file in scan(base_dir) {
        if file.modified < cutoff {
            match std::fs::remove_file(&file.path) {
                Ok(()) => {
                    removed += 1;
                    bytes += file.size;
                }
                Err(e) => warn!("Cleanup error for {:?}: {}", file.path, e),
            }
        }
    }
    (removed, bytes)
}

fn collect_json(dir: &Path, out: &mut Vec<StoredFile>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_json(&path, out);
        } else if path.extension().is_some_and(|e| e == "json") {
            if let Ok(meta) = entry.metadata() {
                out.push(StoredFile {
                    size: meta.len(),
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    path,
                });
            }
        }
    }
}
