// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Move journal for undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::Result;

/// A single file move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub from: PathBuf,
    pub to: PathBuf,
    pub pattern: String,
    #[serde(default)]
    pub undone: bool,
}

impl JournalEntry {
    pub fn new(from: PathBuf, to: PathBuf, pattern: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            from,
            to,
            pattern: pattern.into(),
            undone: false,
        }
    }
}

/// Append-only JSONL log of moves
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    /// Every parseable entry, oldest first
    pub fn read_all(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping malformed journal line: {}", e),
            }
        }
        Ok(entries)
    }

    /// Newest first
    pub fn recent(&self, count: usize) -> Result<Vec<JournalEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    /// Moves not yet reversed, newest first
    pub fn undoable(&self) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<_> = self.read_all()?.into_iter().filter(|e| !e.undone).collect();
        entries.reverse();
        Ok(entries)
    }

    pub fn mark_undone(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let entries = self.read_all()?;

        let mut writer = BufWriter::new(File::create(&self.path)?);
        for mut entry in entries {
            if ids.contains(&entry.id) {
                entry.undone = true;
            }
            writeln!(writer, "{}", serde_json::to_string(&entry)?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_recent_order() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.jsonl"));
        for name in ["a", "b", "c"] {
            journal
                .append(&JournalEntry::new(name.into(), format!("src/{}", name).into(), "*"))
                .unwrap();
        }

        let recent = journal.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].from, PathBuf::from("c"));
        assert_eq!(recent[1].from, PathBuf::from("b"));
    }

    #[test]
    fn test_mark_undone_filters_undoable() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path().join("journal.jsonl"));
        let first = JournalEntry::new("a".into(), "x/a".into(), "*");
        let second = JournalEntry::new("b".into(), "x/b".into(), "*");
        journal.append(&first).unwrap();
        journal.append(&second).unwrap();

        journal.mark_undone(&[second.id.clone()]).unwrap();
        let undoable = journal.undoable().unwrap();
        assert_eq!(undoable.len(), 1);
        assert_eq!(undoable[0].id, first.id);
        assert_eq!(journal.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_line_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let entry = JournalEntry::new("a".into(), "b".into(), "*");
        fs::write(&path, format!("not json\n{}\n", serde_json::to_string(&entry).unwrap())).unwrap();

        let journal = Journal::new(path);
        assert_eq!(journal.read_all().unwrap(), vec![entry]);
    }
}
