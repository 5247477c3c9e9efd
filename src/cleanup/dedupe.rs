// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Duplicate news collection removal

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::Result;

#[derive(Debug, Default, Serialize)]
pub struct DedupeReport {
    pub scanned: usize,
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
    /// Valid JSON without a top-level `articles` array; never touched
    pub skipped: Vec<PathBuf>,
}

/// Hash of a collection's articles, ignoring `collected_at`
///
/// `None` when the document has no top-level `articles` array.
pub fn content_hash(collection: &Value) -> Option<String> {
    let articles: Vec<Value> = collection
        .get("articles")
        .and_then(Value::as_array)?
        .iter()
        .map(|article| match article {
            Value::Object(fields) => {
                let mut fields = fields.clone();
                fields.remove("collected_at");
                Value::Object(fields)
            }
            other => other.clone(),
        })
        .collect();

    // serde_json maps are key-sorted, so equal content serializes identically
    let canonical = Value::Array(articles).to_string();
    Some(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

/// Keep the newest file (by name) of each identical group under `dir`
pub fn dedupe_collections(dir: &Path, dry_run: bool) -> Result<DedupeReport> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut report = DedupeReport { scanned: files.len(), ..Default::default() };
    let mut groups: HashMap<String, Vec<PathBuf>> = HashMap::new();

    for path in files {
        let parsed = fs::read_to_string(&path)
            .map_err(crate::DatavaultError::from)
            .and_then(|text| Ok(serde_json::from_str::<Value>(&text)?));
        match parsed {
            Ok(document) => match content_hash(&document) {
                Some(hash) => groups.entry(hash).or_default().push(path),
                None => {
                    debug!("Not a news collection: {:?}", path);
                    report.skipped.push(path);
                }
            },
            Err(e) => {
                error!("Error processing {:?}: {}", path, e);
                report.unreadable.push(path);
            }
        }
    }

    for (_, mut group) in groups {
        group.sort();
        let Some(newest) = group.pop() else { continue };
        for duplicate in group {
            info!("Removing duplicate: {:?}", duplicate);
            if !dry_run {
                fs::remove_file(&duplicate)?;
            }
            report.removed.push(duplicate);
        }
        report.kept.push(newest);
    }

    report.kept.sort();
    report.removed.sort();
    report.skipped.sort();
    Ok(report)
}
