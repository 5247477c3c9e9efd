// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Working directory and git context for the default system prompt

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntryInfo {
    File { name: String, size: u64 },
    Directory { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GitInfo {
    pub branch: Option<String>,
    /// "clean" or "dirty"
    pub status: Option<String>,
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryContext {
    pub current_dir: PathBuf,
    pub files: Vec<EntryInfo>,
    pub git: GitInfo,
}

impl DirectoryContext {
    /// Best effort: unreadable directories and missing git both yield partial context
    pub async fn gather(path: &Path) -> Self {
        let current_dir = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());

        let files = match list_entries(path).await {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not read directory contents: {}", e);
                Vec::new()
            }
        };

        Self {
            current_dir,
            files,
            git: git_info(path).await,
        }
    }
}

async fn list_entries(path: &Path) -> std::io::Result<Vec<EntryInfo>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            entries.push(EntryInfo::File { name, size: metadata.len() });
        } else {
            entries.push(EntryInfo::Directory { name });
        }
    }
    entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
    Ok(entries)
}

fn entry_name(entry: &EntryInfo) -> &str {
    match entry {
        EntryInfo::File { name, .. } | EntryInfo::Directory { name } => name,
    }
}

/// Trimmed stdout of a successful git command
async fn git(path: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).current_dir(path).output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub async fn git_info(path: &Path) -> GitInfo {
    if git(path, &["rev-parse", "--git-dir"]).await.is_none() {
        debug!("{:?} is not a git repository", path);
        return GitInfo::default();
    }

    let status = git(path, &["status", "--porcelain"])
        .await
        .map(|out| if out.is_empty() { "clean" } else { "dirty" }.to_string());

    GitInfo {
        branch: git(path, &["branch", "--show-current"]).await.filter(|b| !b.is_empty()),
        status,
        remote: git(path, &["remote", "get-url", "origin"]).await.filter(|r| !r.is_empty()),
    }
}

pub fn system_prompt(context: &DirectoryContext) -> String {
    format!(
        "You are a helpful but concise AI assistant. You aim to provide clear, direct answers in as few words as possible.

Current context:
- Directory: {}
- Files: {} items
- Git: {} ({})

Guidelines:
- Keep responses under 100 words
- Use bullet points when listing
- Focus on essential information
- Avoid unnecessary explanations",
        context.current_dir.display(),
        context.files.len(),
        context.git.branch.as_deref().unwrap_or("Not a git repo"),
        context.git.status.as_deref().unwrap_or("N/A"),
    )
}
