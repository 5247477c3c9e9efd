// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Cleanup rules loaded from `cleanup_config.yaml`

use glob::Pattern;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{DatavaultError, Result};

/// One `pattern: destination` rule
#[derive(Debug, Clone)]
pub struct FileMapping {
    pub pattern: Pattern,
    pub destination: PathBuf,
}

impl FileMapping {
    pub fn new(pattern: &str, destination: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
            destination: destination.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Checked in file order; the first match wins
    pub file_mappings: Vec<FileMapping>,
    pub protected_paths: Vec<PathBuf>,
    pub ignore_dirs: Vec<String>,
}

/// On-disk shape; `Mapping` keeps insertion order
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    file_mappings: Mapping,
    #[serde(default)]
    protected_paths: Vec<PathBuf>,
    #[serde(default)]
    ignore_dirs: Vec<String>,
}

const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("test_*.py", "tests"),
    ("*.py", "src"),
    ("*.md", "docs"),
    ("*.json", "datasets/raw"),
    ("*.png", "output/figures"),
    ("*.ipynb", "notebooks"),
    ("*.yml", "config"),
    ("*.yaml", "config"),
    ("*.sql", "sql"),
];

const DEFAULT_PROTECTED: &[&str] = &[
    "cleanup_config.yaml",
    "requirements.txt",
    "README.md",
    "setup.py",
    ".gitignore",
    ".env",
    "pyproject.toml",
    "setup.cfg",
    "Cargo.toml",
    "config.json",
    "search_history.json",
    "cleanup_journal.jsonl",
    "datavault.db",
];

const DEFAULT_IGNORED: &[&str] = &[
    ".git",
    "__pycache__",
    ".pytest_cache",
    "venv",
    "env",
    "backup_",
    ".idea",
    ".vscode",
    "node_modules",
    "target",
];

impl Default for CleanupConfig {
    fn default() -> Self {
        let file_mappings = DEFAULT_MAPPINGS
            .iter()
            .map(|(pattern, dest)| FileMapping {
                // Patterns above are literals known to parse
                pattern: Pattern::new(pattern).unwrap_or_default(),
                destination: PathBuf::from(dest),
            })
            .collect();

        Self {
            file_mappings,
            protected_paths: DEFAULT_PROTECTED.iter().map(PathBuf::from).collect(),
            ignore_dirs: DEFAULT_IGNORED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CleanupConfig {
    /// Load rules from YAML, falling back to the defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No cleanup config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;

        let mut file_mappings = Vec::with_capacity(raw.file_mappings.len());
        for (key, value) in raw.file_mappings {
            let (Value::String(pattern), Value::String(dest)) = (key, value) else {
                return Err(DatavaultError::Config(
                    "file_mappings entries must be `pattern: directory` strings".to_string(),
                ));
            };
            file_mappings.push(FileMapping::new(&pattern, dest)?);
        }

        Ok(Self {
            file_mappings,
            protected_paths: raw.protected_paths,
            ignore_dirs: raw.ignore_dirs,
        })
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        let mut mappings = Mapping::new();
        for mapping in &self.file_mappings {
            mappings.insert(
                Value::String(mapping.pattern.as_str().to_string()),
                Value::String(mapping.destination.to_string_lossy().into_owned()),
            );
        }
        let raw = RawConfig {
            file_mappings: mappings,
            protected_paths: self.protected_paths.clone(),
            ignore_dirs: self.ignore_dirs.clone(),
        };
        Ok(serde_yaml::to_string(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml_string()?)?;
        info!("Cleanup config saved to {:?}", path);
        Ok(())
    }

    /// Destination and pattern of the first rule matching `file_name`
    pub fn classify(&self, file_name: &str) -> Option<&FileMapping> {
        self.file_mappings
            .iter()
            .find(|m| m.pattern.matches(file_name))
    }

    /// `relative` is root-relative
    pub fn is_protected(&self, relative: &Path) -> bool {
        self.protected_paths.iter().any(|p| p == relative)
    }

    /// Protect `path` when it is a file directly under `root`
    ///
    /// Both sides are canonicalized so relative and absolute spellings of the
    /// same location agree. Paths that do not exist yet are compared through
    /// their parent directory.
    pub fn protect_under(&mut self, root: &Path, path: &Path) {
        let Ok(root) = fs::canonicalize(root) else { return };
        let Some(name) = path.file_name() else { return };
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Ok(parent) = fs::canonicalize(parent) else { return };
        if parent != root {
            return;
        }
        let relative = PathBuf::from(name);
        if !self.is_protected(&relative) {
            debug!("Protecting {:?} during cleanup", relative);
            self.protected_paths.push(relative);
        }
    }

    /// Exact names, or prefixes for entries ending in `_`
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|ignored| {
            if ignored.ends_with('_') {
                name.starts_with(ignored.as_str())
            } else {
                name == ignored
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let config = CleanupConfig::default();
        let test_file = config.classify("test_parser.py").unwrap();
        assert_eq!(test_file.destination, PathBuf::from("tests"));
        let module = config.classify("parser.py").unwrap();
        assert_eq!(module.destination, PathBuf::from("src"));
        assert_eq!(
            config.classify("settings.yaml").unwrap().destination,
            PathBuf::from("config")
        );
        assert!(config.classify("Makefile").is_none());
    }

    #[test]
    fn test_yaml_order_preserved() {
        let yaml = r#"
file_mappings:
  "*.py": src
  "test_*.py": tests
protected_paths:
  - main.py
ignore_dirs:
  - .git
  - backup_
"#;
        let config = CleanupConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.file_mappings[0].pattern.as_str(), "*.py");
        // Reordered rules shadow the test rule
        assert_eq!(
            config.classify("test_x.py").unwrap().destination,
            PathBuf::from("src")
        );
        assert!(config.is_protected(Path::new("main.py")));
        assert!(config.is_ignored_dir("backup_2024"));
        assert!(config.is_ignored_dir(".git"));
        assert!(!config.is_ignored_dir(".github"));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let yaml = "file_mappings:\n  \"[\": src\n";
        assert!(matches!(
            CleanupConfig::from_yaml_str(yaml),
            Err(DatavaultError::Pattern(_))
        ));
    }

    #[test]
    fn test_non_string_destination_rejected() {
        let yaml = "file_mappings:\n  \"*.py\": [src]\n";
        assert!(matches!(
            CleanupConfig::from_yaml_str(yaml),
            Err(DatavaultError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_keeps_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleanup_config.yaml");
        CleanupConfig::default().save(&path).unwrap();

        let loaded = CleanupConfig::load(&path).unwrap();
        let patterns: Vec<_> = loaded.file_mappings.iter().map(|m| m.pattern.as_str()).collect();
        assert_eq!(patterns[0], "test_*.py");
        assert_eq!(patterns.len(), DEFAULT_MAPPINGS.len());
    }

    #[test]
    fn test_own_state_files_protected_by_default() {
        let config = CleanupConfig::default();
        assert!(config.classify("search_history.json").is_some());
        assert!(config.is_protected(Path::new("search_history.json")));
        assert!(config.is_protected(Path::new("cleanup_journal.jsonl")));
    }

    #[test]
    fn test_protect_under_root_only() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state");
        fs::create_dir(&nested).unwrap();
        let mut config = CleanupConfig::default();

        config.protect_under(dir.path(), &dir.path().join("my_history.json"));
        config.protect_under(dir.path(), &nested.join("journal.jsonl"));
        config.protect_under(dir.path(), &dir.path().join("my_history.json"));

        assert!(config.is_protected(Path::new("my_history.json")));
        assert!(!config.is_protected(Path::new("journal.jsonl")));
        let count = config
            .protected_paths
            .iter()
            .filter(|p| *p == Path::new("my_history.json"))
            .count();
        assert_eq!(count, 1);
    }
}
