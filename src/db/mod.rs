// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SQLite store for remote search logs

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::api::SearchLog;
use crate::{DatavaultError, Result};

/// Search log store (thread-safe wrapper)
#[derive(Clone)]
pub struct SearchLogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SearchLogStore {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.initialize()?;
        Ok(store)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DatavaultError::Config("Database lock poisoned".to_string()))
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS search_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                query TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_search_logs_user ON search_logs(user_id, timestamp);
        "#,
        )?;
        Ok(())
    }

    pub fn insert(&self, log: &SearchLog) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO search_logs (user_id, query, timestamp) VALUES (?1, ?2, ?3)",
            params![log.user_id, log.query, log.timestamp.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Every log for `user_id`, oldest first
    pub fn for_user(&self, user_id: &str) -> Result<Vec<SearchLog>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT user_id, query, timestamp FROM search_logs
               WHERE user_id = ?1 ORDER BY timestamp ASC, id ASC"#,
        )?;

        let logs = stmt
            .query_map(params![user_id], |row| {
                let timestamp: String = row.get(2)?;
                Ok(SearchLog {
                    user_id: row.get(0)?,
                    query: row.get(1)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    pub fn count(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.query_row("SELECT COUNT(*) FROM search_logs", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log(user: &str, query: &str, hour: u32) -> SearchLog {
        SearchLog {
            user_id: user.to_string(),
            query: query.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_for_user_ordered_and_scoped() {
        let store = SearchLogStore::in_memory().unwrap();
        store.insert(&log("alice", "late", 12)).unwrap();
        store.insert(&log("bob", "other", 9)).unwrap();
        store.insert(&log("alice", "early", 8)).unwrap();

        let logs = store.for_user("alice").unwrap();
        let queries: Vec<_> = logs.iter().map(|l| l.query.as_str()).collect();
        assert_eq!(queries, vec!["early", "late"]);
        assert_eq!(logs[0].timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn test_unknown_user_empty() {
        let store = SearchLogStore::in_memory().unwrap();
        assert!(store.for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.db");
        SearchLogStore::open(&path).unwrap().insert(&log("u", "q", 1)).unwrap();
        assert_eq!(SearchLogStore::open(&path).unwrap().count().unwrap(), 1);
    }
}
