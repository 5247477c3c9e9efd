// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Plan, apply and reverse root-level file moves

use chrono::Local;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::config::CleanupConfig;
use super::journal::{Journal, JournalEntry};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Protected,
    Hidden,
    Unmatched,
    IgnoredDir,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupPlan {
    pub root: PathBuf,
    pub moves: Vec<PlannedMove>,
    pub skipped: Vec<Skipped>,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ExecutionReport {
    pub moved: Vec<JournalEntry>,
    pub failed: Vec<(PathBuf, String)>,
    pub dry_run: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct UndoReport {
    pub restored: Vec<JournalEntry>,
    pub skipped: Vec<(JournalEntry, String)>,
}

/// Classify every file directly under `root`
pub fn plan(root: &Path, config: &CleanupConfig) -> Result<CleanupPlan> {
    let mut entries: Vec<_> = fs::read_dir(root)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    let mut plan = CleanupPlan {
        root: root.to_path_buf(),
        ..Default::default()
    };

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = PathBuf::from(&name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if config.is_ignored_dir(&name) {
                plan.skipped.push(Skipped { path: relative, reason: SkipReason::IgnoredDir });
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let reason = if config.is_protected(&relative) {
            Some(SkipReason::Protected)
        } else if name.starts_with('.') {
            Some(SkipReason::Hidden)
        } else {
            None
        };
        if let Some(reason) = reason {
            plan.skipped.push(Skipped { path: relative, reason });
            continue;
        }

        match config.classify(&name) {
            Some(mapping) => plan.moves.push(PlannedMove {
                from: relative.clone(),
                to: mapping.destination.join(&relative),
                pattern: mapping.pattern.as_str().to_string(),
            }),
            None => plan.skipped.push(Skipped { path: relative, reason: SkipReason::Unmatched }),
        }
    }

    debug!("Planned {} moves, {} skipped", plan.moves.len(), plan.skipped.len());
    Ok(plan)
}

/// `stem_YYYYmmdd_HHMMSS.ext` alongside `target`
fn collision_free(target: &Path) -> PathBuf {
    if !target.exists() {
        return target.to_path_buf();
    }
    let stem = target.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let name = match target.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    let mut candidate = target.with_file_name(name);
    let mut n = 1;
    while candidate.exists() {
        let name = match target.extension() {
            Some(ext) => format!("{}_{}_{}.{}", stem, stamp, n, ext.to_string_lossy()),
            None => format!("{}_{}_{}", stem, stamp, n),
        };
        candidate = target.with_file_name(name);
        n += 1;
    }
    candidate
}

/// Apply `plan`, journaling each move that succeeds
pub fn execute(plan: &CleanupPlan, journal: &Journal, dry_run: bool) -> Result<ExecutionReport> {
    let mut report = ExecutionReport { dry_run, ..Default::default() };

    for planned in &plan.moves {
        let source = plan.root.join(&planned.from);
        let target = collision_free(&plan.root.join(&planned.to));

        if dry_run {
            info!("[DRY RUN] Would move: {:?} -> {:?}", source, target);
            report.moved.push(JournalEntry::new(source, target, planned.pattern.clone()));
            continue;
        }

        let moved = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::rename(&source, &target));

        match moved {
            Ok(()) => {
                info!("Moved: {:?} -> {:?}", source, target);
                let entry = JournalEntry::new(source, target, planned.pattern.clone());
                journal.append(&entry)?;
                report.moved.push(entry);
            }
            Err(e) => {
                warn!("Failed to move {:?}: {}", source, e);
                report.failed.push((source, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Reverse the `count` most recent moves still on record; 0 means all
pub fn undo(journal: &Journal, count: usize, dry_run: bool) -> Result<UndoReport> {
    let mut candidates = journal.undoable()?;
    if count > 0 {
        candidates.truncate(count);
    }

    let mut report = UndoReport::default();
    for entry in candidates {
        if !entry.to.exists() {
            report.skipped.push((entry, "file not found, may have been moved or deleted".into()));
            continue;
        }
        if entry.from.exists() {
            report.skipped.push((entry, "original path already exists".into()));
            continue;
        }
        if dry_run {
            info!("[DRY RUN] Would restore: {:?} -> {:?}", entry.to, entry.from);
            report.restored.push(entry);
            continue;
        }
        match fs::rename(&entry.to, &entry.from) {
            Ok(()) => {
                info!("Restored: {:?} -> {:?}", entry.to, entry.from);
                report.restored.push(entry);
            }
            Err(e) => report.skipped.push((entry, e.to_string())),
        }
    }

    if !dry_run {
        let ids: Vec<String> = report.restored.iter().map(|e| e.id.clone()).collect();
        journal.mark_undone(&ids)?;
    }
    Ok(report)
}
