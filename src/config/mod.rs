// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for datavault

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Search client settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Upstream news provider
    #[serde(default)]
    pub news: NewsConfig,

    /// Response cache settings (server side)
    #[serde(default)]
    pub cache: CacheConfig,

    /// Cache monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// LLM providers used by novatool
    #[serde(default)]
    pub llm: LlmConfig,

    /// Repository housekeeping
    #[serde(default)]
    pub cleanup: CleanupSettings,

    /// Web server settings
    #[serde(default)]
    pub web: WebConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Base URL of the search/cache API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// File standing in for the browser session store
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_news_url")]
    pub base_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Environment variable holding the NewsAPI key
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    #[serde(default = "default_memory_ttl")]
    pub memory_ttl_secs: u64,
    #[serde(default = "default_cleanup_days")]
    pub cleanup_days: u64,
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,
    #[serde(default = "default_preload_queries")]
    pub preload_queries: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_chart_points")]
    pub chart_points: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_pokeapi_url")]
    pub pokeapi_url: String,
    #[serde(default = "default_pokemon_max")]
    pub pokemon_max_id: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelPair {
    pub primary: String,
    pub fallback: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    #[serde(default = "default_ollama_models")]
    pub ollama: ModelPair,
    #[serde(default = "default_openai_models")]
    pub openai: ModelPair,
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,
    /// Write a Markdown transcript for every run, not only with --save
    #[serde(default)]
    pub transcripts: bool,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CleanupSettings {
    #[serde(default = "default_cleanup_config")]
    pub config_path: PathBuf,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
    #[serde(default = "default_collections_dir")]
    pub collections_dir: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Origins allowed by CORS; empty means permissive
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

// Default value functions
fn default_api_url() -> String { "http://localhost:8000".to_string() }
fn default_debounce_ms() -> u64 { 300 }
fn default_history_path() -> PathBuf { PathBuf::from("search_history.json") }
fn default_user_id() -> String { "default".to_string() }
fn default_client_timeout() -> u64 { 15 }
fn default_news_url() -> String { "https://newsapi.org/v2".to_string() }
fn default_country() -> String { "us".to_string() }
fn default_language() -> String { "en".to_string() }
fn default_news_key_env() -> String { "NEWS_API_KEY".to_string() }
fn default_cache_dir() -> PathBuf { PathBuf::from("cache") }
fn default_memory_capacity() -> usize { 100 }
fn default_memory_ttl() -> u64 { 3600 }
fn default_cleanup_days() -> u64 { 7 }
/// Ten years
pub const MAX_CLEANUP_DAYS: u64 = 3650;
fn default_max_size() -> u64 { 100 * 1024 * 1024 }
fn default_poll_interval() -> u64 { 5 }
fn default_chart_points() -> usize { 20 }
fn default_pokeapi_url() -> String { "https://pokeapi.co/api/v2".to_string() }
fn default_pokemon_max() -> u32 { 151 }
fn default_ollama_url() -> String { "http://localhost:11434".to_string() }
fn default_openai_url() -> String { "https://api.openai.com".to_string() }
fn default_outputs_dir() -> PathBuf { PathBuf::from("outputs") }
fn default_llm_timeout() -> u64 { 120 }
fn default_cleanup_config() -> PathBuf { PathBuf::from("cleanup_config.yaml") }
fn default_journal_path() -> PathBuf { PathBuf::from("cleanup_journal.jsonl") }
fn default_collections_dir() -> PathBuf { PathBuf::from("datasets/news/raw") }
fn default_web_host() -> String { "127.0.0.1".to_string() }
fn default_web_port() -> u16 { 8000 }
fn default_db_path() -> String { "datavault.db".to_string() }

fn default_preload_queries() -> Vec<String> {
    vec!["technology", "business", "science", "health", "sports"]
        .into_iter().map(String::from).collect()
}

fn default_ollama_models() -> ModelPair {
    ModelPair {
        primary: "nemotron-mini".to_string(),
        fallback: "llama3.2".to_string(),
    }
}

fn default_openai_models() -> ModelPair {
    ModelPair {
        primary: "gpt-4o-mini".to_string(),
        fallback: "gpt-3.5-turbo".to_string(),
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            debounce_ms: default_debounce_ms(),
            history_path: default_history_path(),
            user_id: default_user_id(),
            timeout_secs: default_client_timeout(),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_url(),
            country: default_country(),
            language: default_language(),
            api_key_env: default_news_key_env(),
            timeout_secs: default_client_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: default_cache_dir(),
            memory_capacity: default_memory_capacity(),
            memory_ttl_secs: default_memory_ttl(),
            cleanup_days: default_cleanup_days(),
            max_size_bytes: default_max_size(),
            preload_queries: default_preload_queries(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            poll_interval_secs: default_poll_interval(),
            chart_points: default_chart_points(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            pokeapi_url: default_pokeapi_url(),
            pokemon_max_id: default_pokemon_max(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            openai_url: default_openai_url(),
            ollama: default_ollama_models(),
            openai: default_openai_models(),
            outputs_dir: default_outputs_dir(),
            transcripts: false,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            config_path: default_cleanup_config(),
            journal_path: default_journal_path(),
            collections_dir: default_collections_dir(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl CacheConfig {
    pub fn memory_ttl(&self) -> Duration {
        Duration::from_secs(self.memory_ttl_secs)
    }
}

impl NewsConfig {
    /// Read the NewsAPI key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::DatavaultError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make a component misbehave
    pub fn validate(&self) -> crate::Result<()> {
        if self.cache.memory_capacity == 0 {
            return Err(crate::DatavaultError::Config(
                "cache.memory_capacity must be at least 1".to_string(),
            ));
        }
        if self.cache.cleanup_days > MAX_CLEANUP_DAYS {
            return Err(crate::DatavaultError::Config(format!(
                "cache.cleanup_days must be at most {}",
                MAX_CLEANUP_DAYS
            )));
        }
        if self.monitor.chart_points == 0 {
            return Err(crate::DatavaultError::Config(
                "monitor.chart_points must be at least 1".to_string(),
            ));
        }
        if self.dashboard.pokemon_max_id == 0 {
            return Err(crate::DatavaultError::Config(
                "dashboard.pokemon_max_id must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.search.debounce_ms, 300);
        assert_eq!(config.monitor.poll_interval_secs, 5);
        assert_eq!(config.llm.ollama.primary, "nemotron-mini");
        assert_eq!(config.cache.preload_queries.len(), 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"web": {"port": 9090}}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.web.port, 9090);
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.cache.memory_capacity, 100);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.search.user_id = "alice".to_string();
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.search.user_id, "alice");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache": {"memory_capacity": 0}}"#).unwrap();
        assert!(AppConfig::load(&path).is_err());
    }

    #[test]
    fn test_cleanup_days_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache": {"cleanup_days": 3650}}"#).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap().cache.cleanup_days, MAX_CLEANUP_DAYS);

        std::fs::write(&path, r#"{"cache": {"cleanup_days": 18446744073709551615}}"#).unwrap();
        assert!(AppConfig::load(&path).is_err());
    }
}
