// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for datavault

use thiserror::Error;

/// Result type alias for datavault operations
pub type Result<T> = std::result::Result<T, DatavaultError>;

/// datavault error types
#[derive(Error, Debug)]
pub enum DatavaultError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}
