// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! `ai_history.json` log and Markdown transcripts

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Exchange;
use crate::Result;

pub const HISTORY_FILE: &str = "ai_history.json";
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiHistoryEntry {
    pub timestamp: DateTime<Local>,
    pub prompt: String,
    pub response: String,
    pub model: String,
    #[serde(default)]
    pub provider: String,
    /// Seconds formatted as `1.23s`
    pub time: String,
    pub words: usize,
    pub chars: usize,
}

impl From<&Exchange> for AiHistoryEntry {
    fn from(exchange: &Exchange) -> Self {
        Self {
            timestamp: Local::now(),
            prompt: exchange.prompt.clone(),
            response: exchange.response.clone(),
            model: exchange.model.clone(),
            provider: exchange.provider.to_string(),
            time: format!("{:.2}s", exchange.elapsed.as_secs_f64()),
            words: exchange.words(),
            chars: exchange.chars(),
        }
    }
}

impl AiHistoryEntry {
    /// The response cut to `PREVIEW_CHARS` characters
    pub fn preview(&self) -> String {
        if self.response.chars().count() > PREVIEW_CHARS {
            let cut: String = self.response.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            self.response.clone()
        }
    }
}

/// JSON array of every exchange, oldest first
pub struct AiHistory {
    path: PathBuf,
}

impl AiHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(outputs_dir: &Path) -> Self {
        Self::new(outputs_dir.join(HISTORY_FILE))
    }

    pub fn read_all(&self) -> Result<Vec<AiHistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Append `entry`; an unreadable file is moved aside before a new one starts
    pub fn append(&self, entry: AiHistoryEntry) -> Result<()> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(e) => {
                let backup = self.backup_path();
                fs::rename(&self.path, &backup)?;
                warn!(
                    "Unreadable history at {:?} ({}), moved to {:?}",
                    self.path, e, backup
                );
                Vec::new()
            }
        };
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        info!("History saved to {:?}", self.path);
        Ok(())
    }

    /// `ai_history.json.bak`, or a timestamped name when that is taken
    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".bak");
        let backup = self.path.with_file_name(&name);
        if !backup.exists() {
            return backup;
        }
        name.push(format!(".{}", Local::now().format("%Y%m%d_%H%M%S_%3f")));
        self.path.with_file_name(name)
    }

    /// The newest `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<AiHistoryEntry>> {
        let entries = self.read_all()?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).rev().collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Markdown record of one novatool run
#[derive(Debug, Clone)]
pub struct Transcript {
    pub command: String,
    pub provider: String,
    pub model: Option<String>,
    pub elapsed_secs: Option<f64>,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl Transcript {
    pub fn from_exchange(command: &str, exchange: &Exchange) -> Self {
        Self {
            command: command.to_string(),
            provider: exchange.provider.to_string(),
            model: Some(exchange.model.clone()),
            elapsed_secs: Some(exchange.elapsed.as_secs_f64()),
            response: Some(exchange.response.clone()),
            error: None,
        }
    }

    pub fn failed(command: &str, provider: &str, error: &str) -> Self {
        Self {
            command: command.to_string(),
            provider: provider.to_string(),
            model: None,
            elapsed_secs: None,
            response: None,
            error: Some(error.to_string()),
        }
    }

    pub fn to_markdown(&self, at: DateTime<Local>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# novatool transcript\n");
        let _ = writeln!(out, "- **Date:** {}", at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "- **Command:** `{}`", self.command);
        let _ = writeln!(out, "- **Provider:** {}", self.provider);
        if let Some(model) = &self.model {
            let _ = writeln!(out, "- **Model:** {}", model);
        }
        if let Some(secs) = self.elapsed_secs {
            let _ = writeln!(out, "- **Time:** {:.2}s", secs);
        }
        if let Some(response) = &self.response {
            let _ = writeln!(out, "\n## Response\n\n{}", response);
        }
        if let Some(error) = &self.error {
            let _ = writeln!(out, "\n## Error\n\n```\n{}\n```", error);
        }
        out
    }

    /// Write to `outputs_dir/novatool_<timestamp>.md`
    pub fn save(&self, outputs_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(outputs_dir)?;
        let now = Local::now();
        let path = outputs_dir.join(format!("novatool_{}.md", now.format("%Y%m%d_%H%M%S_%3f")));
        fs::write(&path, self.to_markdown(now))?;
        info!("Transcript saved to {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use std::time::Duration;

    fn exchange(response: &str) -> Exchange {
        Exchange {
            prompt: "what is rust".into(),
            response: response.into(),
            model: "nemotron-mini".into(),
            provider: Provider::Ollama,
            elapsed: Duration::from_millis(1234),
        }
    }

    #[test]
    fn test_entry_stats() {
        let entry = AiHistoryEntry::from(&exchange("a systems language"));
        assert_eq!(entry.words, 3);
        assert_eq!(entry.chars, 18);
        assert_eq!(entry.time, "1.23s");
        assert_eq!(entry.provider, "ollama");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        let long = "é".repeat(150);
        let entry = AiHistoryEntry::from(&exchange(&long));
        let preview = entry.preview();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(AiHistoryEntry::from(&exchange("short")).preview(), "short");
    }

    #[test]
    fn test_history_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = AiHistory::in_dir(&dir.path().join("outputs"));
        for answer in ["one", "two", "three"] {
            history.append(AiHistoryEntry::from(&exchange(answer))).unwrap();
        }

        let recent = history.recent(2).unwrap();
        let responses: Vec<_> = recent.iter().map(|e| e.response.as_str()).collect();
        assert_eq!(responses, vec!["three", "two"]);

        // Stored as a plain JSON array
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(history.path()).unwrap()).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_unreadable_history_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let history = AiHistory::in_dir(dir.path());
        let truncated = r#"[{"timestamp":"2024-05-01T10:00:00+00:00","prompt":"p","response":"old""#;
        fs::write(history.path(), truncated).unwrap();

        history.append(AiHistoryEntry::from(&exchange("new"))).unwrap();
        history.append(AiHistoryEntry::from(&exchange("newer"))).unwrap();

        let backup = dir.path().join("ai_history.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), truncated);
        let responses: Vec<_> = history
            .read_all()
            .unwrap()
            .into_iter()
            .map(|e| e.response)
            .collect();
        assert_eq!(responses, vec!["new", "newer"]);
    }

    #[test]
    fn test_second_backup_does_not_overwrite_first() {
        let dir = tempfile::tempdir().unwrap();
        let history = AiHistory::in_dir(dir.path());
        for garbage in ["{first", "{second"] {
            fs::write(history.path(), garbage).unwrap();
            history.append(AiHistoryEntry::from(&exchange("x"))).unwrap();
        }

        let mut backups: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("ai_history.json.bak"))
            .collect();
        backups.sort();
        assert_eq!(backups.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join(&backups[0])).unwrap(), "{first");
    }

    #[test]
    fn test_transcript_records_error() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = Transcript::failed("ask hi", "openai", "Missing API key: set OPENAI_API_KEY");
        let path = transcript.save(dir.path()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("- **Provider:** openai"));
        assert!(text.contains("## Error"));
        assert!(!text.contains("## Response"));
    }

    #[test]
    fn test_transcript_records_response() {
        let markdown = Transcript::from_exchange("ask what is rust", &exchange("fast"))
            .to_markdown(Local::now());
        assert!(markdown.contains("- **Model:** nemotron-mini"));
        assert!(markdown.contains("- **Time:** 1.23s"));
        assert!(markdown.contains("## Response\n\nfast"));
    }
}
