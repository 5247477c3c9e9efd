// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Directory listings for `novatool list`, saved as `file_list_*.json`

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::Result;

/// Entries never listed
const SKIPPED_NAMES: &[&str] = &["__pycache__", ".DS_Store", ".idea"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedEntry {
    pub name: String,
    pub is_file: bool,
    /// Zero for directories
    pub size: u64,
}

impl ListedEntry {
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Visible and hidden entries, each files first then directories, by name
#[derive(Debug, Default)]
pub struct Listing {
    pub root: PathBuf,
    pub visible: Vec<ListedEntry>,
    pub hidden: Vec<ListedEntry>,
}

/// Saved form of a listing
#[derive(Debug, Serialize)]
pub struct FileListRecord<'a> {
    pub path: String,
    pub include_hidden: bool,
    pub files: Vec<&'a str>,
    pub timestamp: String,
}

pub async fn list_directory(path: &Path) -> Result<Listing> {
    let root = tokio::fs::canonicalize(path).await?;
    let mut listing = Listing { root: root.clone(), ..Default::default() };

    let mut dir = tokio::fs::read_dir(&root).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if SKIPPED_NAMES.contains(&name.as_str()) {
            continue;
        }
        let metadata = entry.metadata().await?;
        let listed = ListedEntry {
            is_file: metadata.is_file(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            name,
        };
        if listed.is_hidden() {
            listing.hidden.push(listed);
        } else {
            listing.visible.push(listed);
        }
    }

    for entries in [&mut listing.visible, &mut listing.hidden] {
        entries.sort_by_key(|e| (!e.is_file, e.name.to_lowercase()));
    }
    Ok(listing)
}

/// `12.0B`, `1.5KB`, ... up to GB
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB"] {
        if size < 1024.0 {
            return format!("{:.1}{}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}GB", size)
}

impl Listing {
    /// Write `outputs_dir/file_list_<timestamp>[_n].json`
    pub fn save(&self, outputs_dir: &Path, include_hidden: bool) -> Result<PathBuf> {
        fs::create_dir_all(outputs_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let mut path = outputs_dir.join(format!("file_list_{}.json", timestamp));
        let mut counter = 1;
        while path.exists() {
            path = outputs_dir.join(format!("file_list_{}_{}.json", timestamp, counter));
            counter += 1;
        }

        let mut files: Vec<&str> = self.visible.iter().map(|e| e.name.as_str()).collect();
        if include_hidden {
            files.extend(self.hidden.iter().map(|e| e.name.as_str()));
        }
        let record = FileListRecord {
            path: self.root.display().to_string(),
            include_hidden,
            files,
            timestamp,
        };

        fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        info!("File list saved to {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(dir: &Path) {
        fs::write(dir.join("beta.txt"), "12345").unwrap();
        fs::write(dir.join("Alpha.md"), "").unwrap();
        fs::write(dir.join(".env"), "A=1").unwrap();
        fs::write(dir.join(".DS_Store"), "").unwrap();
        fs::create_dir(dir.join("src")).unwrap();
        fs::create_dir(dir.join("__pycache__")).unwrap();
        fs::create_dir(dir.join(".git")).unwrap();
    }

    #[tokio::test]
    async fn test_files_before_dirs_hidden_separate() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let listing = list_directory(dir.path()).await.unwrap();
        let visible: Vec<_> = listing.visible.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(visible, vec!["Alpha.md", "beta.txt", "src"]);
        let hidden: Vec<_> = listing.hidden.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(hidden, vec![".env", ".git"]);
        assert_eq!(listing.visible[1].size, 5);
        assert_eq!(listing.visible[2].size, 0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12.0B");
        assert_eq!(format_size(1536), "1.5KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0GB");
    }

    #[tokio::test]
    async fn test_save_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());
        let listing = list_directory(dir.path()).await.unwrap();
        let outputs = dir.path().join("outputs");

        let first = listing.save(&outputs, false).unwrap();
        let second = listing.save(&outputs, true).unwrap();
        assert_ne!(first, second);

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(saved["include_hidden"], false);
        assert_eq!(saved["files"], serde_json::json!(["Alpha.md", "beta.txt", "src"]));

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(saved["files"].as_array().unwrap().len(), 5);
    }
}
