// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! LLM access for novatool: provider selection, prompting and logging

pub mod briefing;
pub mod context;
pub mod listing;
pub mod ollama;
pub mod openai;
pub mod transcript;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{LlmConfig, ModelPair};
use crate::{DatavaultError, Result};

pub use briefing::{brief, Briefing};
pub use context::{system_prompt, DirectoryContext, GitInfo};
pub use listing::{format_size, list_directory, ListedEntry, Listing};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use transcript::{AiHistory, AiHistoryEntry, Transcript};

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// How long the Ollama probe may take before OpenAI is chosen instead
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
        }
    }

    pub fn models<'a>(&self, config: &'a LlmConfig) -> &'a ModelPair {
        match self {
            Provider::Ollama => &config.ollama,
            Provider::OpenAi => &config.openai,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DatavaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAi),
            other => Err(DatavaultError::Config(format!(
                "Unknown provider '{}', expected ollama or openai",
                other
            ))),
        }
    }
}

/// A chat backend answering one system + user prompt pair
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, model: &str, system: &str, prompt: &str) -> Result<String>;

    async fn list_models(&self) -> Result<Vec<String>>;

    fn provider(&self) -> Provider;
}

/// One completed prompt/response pair
#[derive(Debug, Clone)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub provider: Provider,
    pub elapsed: Duration,
}

impl Exchange {
    pub fn words(&self) -> usize {
        self.response.split_whitespace().count()
    }

    pub fn chars(&self) -> usize {
        self.response.chars().count()
    }
}

/// Explicit choice wins; otherwise Ollama if it answers, else OpenAI
pub async fn select_provider(explicit: Option<Provider>, config: &LlmConfig) -> Provider {
    if let Some(provider) = explicit {
        return provider;
    }
    if ollama::probe(&config.ollama_url, PROBE_TIMEOUT).await {
        Provider::Ollama
    } else {
        warn!("Ollama not available at {}, falling back to OpenAI", config.ollama_url);
        Provider::OpenAi
    }
}

pub fn build_provider(provider: Provider, config: &LlmConfig) -> Result<Box<dyn LlmProvider>> {
    let timeout = Duration::from_secs(config.timeout_secs);
    match provider {
        Provider::Ollama => Ok(Box::new(OllamaClient::new(&config.ollama_url, timeout)?)),
        Provider::OpenAi => {
            let api_key = std::env::var(OPENAI_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or(DatavaultError::MissingApiKey(OPENAI_KEY_ENV))?;
            Ok(Box::new(OpenAiClient::new(&config.openai_url, api_key, timeout)?))
        }
    }
}

/// Ask `prompt`; without an explicit model the primary is tried, then the fallback
pub async fn ask(
    backend: &dyn LlmProvider,
    models: &ModelPair,
    model: Option<&str>,
    system: &str,
    prompt: &str,
) -> Result<Exchange> {
    let start = Instant::now();
    let provider = backend.provider();

    let (model, response) = match model {
        Some(model) => (model.to_string(), backend.chat(model, system, prompt).await?),
        None => match backend.chat(&models.primary, system, prompt).await {
            Ok(response) => (models.primary.clone(), response),
            Err(e) => {
                warn!(
                    "{} model {} failed ({}), trying {}",
                    provider, models.primary, e, models.fallback
                );
                let response = backend.chat(&models.fallback, system, prompt).await?;
                (models.fallback.clone(), response)
            }
        },
    };

    let exchange = Exchange {
        prompt: prompt.to_string(),
        response: response.trim().to_string(),
        model,
        provider,
        elapsed: start.elapsed(),
    };
    info!(
        "{} answered with {} in {:.2}s",
        exchange.provider,
        exchange.model,
        exchange.elapsed.as_secs_f64()
    );
    Ok(exchange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        calls: Mutex<Vec<String>>,
        failing_model: &'static str,
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn chat(&self, model: &str, _system: &str, _prompt: &str) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            if model == self.failing_model {
                return Err(DatavaultError::Upstream { status: 404, detail: "model not found".into() });
            }
            Ok(format!("  answer from {}\n", model))
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        fn provider(&self) -> Provider {
            Provider::Ollama
        }
    }

    fn pair() -> ModelPair {
        ModelPair { primary: "nemotron-mini".into(), fallback: "llama3.2".into() }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert!("gemini".parse::<Provider>().is_err());
        assert_eq!(Provider::OpenAi.to_string(), "openai");
    }

    #[tokio::test]
    async fn test_explicit_provider_skips_detection() {
        let config = LlmConfig {
            ollama_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        assert_eq!(select_provider(Some(Provider::Ollama), &config).await, Provider::Ollama);
    }

    #[tokio::test]
    async fn test_unreachable_ollama_selects_openai() {
        let config = LlmConfig {
            ollama_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        assert_eq!(select_provider(None, &config).await, Provider::OpenAi);
    }

    #[tokio::test]
    async fn test_fallback_model_used() {
        let backend = Scripted { calls: Mutex::new(vec![]), failing_model: "nemotron-mini" };
        let exchange = ask(&backend, &pair(), None, "sys", "hi").await.unwrap();
        assert_eq!(exchange.model, "llama3.2");
        assert_eq!(exchange.response, "answer from llama3.2");
        assert_eq!(exchange.words(), 3);
        assert_eq!(*backend.calls.lock().unwrap(), vec!["nemotron-mini", "llama3.2"]);
    }

    #[tokio::test]
    async fn test_explicit_model_has_no_fallback() {
        let backend = Scripted { calls: Mutex::new(vec![]), failing_model: "custom" };
        assert!(ask(&backend, &pair(), Some("custom"), "sys", "hi").await.is_err());
        assert_eq!(backend.calls.lock().unwrap().len(), 1);
    }
}
