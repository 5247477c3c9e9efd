// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Recent-search history backed by a session file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::Result;

/// Most entries kept in the history
pub const MAX_HISTORY: usize = 10;

/// One past search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

/// Search history, most recent first
///
/// Every mutation is written through to the session file so the list
/// survives between CLI invocations the way session storage survives
/// page reloads.
pub struct SearchHistory {
    path: PathBuf,
    entries: Vec<SearchHistoryEntry>,
}

impl SearchHistory {
    /// Load history from the session file, starting empty if it is missing or unreadable
    pub fn load(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<SearchHistoryEntry>>(&content) {
                Ok(mut entries) => {
                    entries.truncate(MAX_HISTORY);
                    entries
                }
                Err(e) => {
                    warn!("Discarding unreadable search history {:?}: {}", path, e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        Self { path, entries }
    }

    /// Record a query at the current time
    pub fn add(&mut self, query: &str) -> Result<()> {
        self.add_at(query, Utc::now())
    }

    /// Prepend an entry and drop anything past the cap
    ///
    /// A timestamp older than the newest entry is raised to match it, so
    /// entries stay newest first even if the clock steps back.
    pub(crate) fn add_at(&mut self, query: &str, timestamp: DateTime<Utc>) -> Result<()> {
        let timestamp = match self.entries.first() {
            Some(newest) => timestamp.max(newest.timestamp),
            None => timestamp,
        };
        self.entries.insert(0, SearchHistoryEntry {
            query: query.to_string(),
            timestamp,
        });
        self.entries.truncate(MAX_HISTORY);
        self.persist()
    }

    pub fn entries(&self) -> &[SearchHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the history and remove the session file
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_capped_and_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SearchHistory::load(dir.path().join("history.json"));
        let start = Utc::now();

        for i in 0..15 {
            history.add_at(&format!("query {i}"), start + Duration::seconds(i)).unwrap();
        }

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.entries()[0].query, "query 14");
        assert_eq!(history.entries()[9].query, "query 5");
        assert!(history
            .entries()
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_duplicates_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SearchHistory::load(dir.path().join("history.json"));
        history.add("rust").unwrap();
        history.add("rust").unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        {
            let mut history = SearchHistory::load(path.clone());
            history.add("first").unwrap();
            history.add("second").unwrap();
        }
        let history = SearchHistory::load(path);
        let queries: Vec<_> = history.entries().iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["second", "first"]);
    }

    #[test]
    fn test_clear_empties_memory_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut history = SearchHistory::load(path.clone());
        history.add("rust").unwrap();
        assert!(path.exists());

        history.clear().unwrap();
        assert!(history.is_empty());
        assert!(!path.exists());
        assert!(SearchHistory::load(path).is_empty());
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(SearchHistory::load(path).is_empty());
    }

    #[test]
    fn test_clock_step_back_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = SearchHistory::load(dir.path().join("history.json"));
        let now = Utc::now();

        history.add_at("later", now).unwrap();
        history.add_at("stepped back", now - Duration::minutes(5)).unwrap();

        let entries = history.entries();
        assert_eq!(entries[0].query, "stepped back");
        assert_eq!(entries[0].timestamp, now);
        assert!(entries.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}
