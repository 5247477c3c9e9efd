// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ollama chat client for local inference

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LlmProvider, Provider};
use crate::{DatavaultError, Result};

/// Appended to every system prompt sent to Ollama
pub const CONCISE_RULES: &str = "STRICT RESPONSE RULES:
1. Maximum response length: 50 words
2. Use bullet points for lists
3. No pleasantries or unnecessary words
4. Focus on core information only
5. Skip examples unless specifically requested";

pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub num_predict: u32,
    pub stop: Vec<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_k: 30,
            top_p: 0.7,
            num_predict: 50,
            stop: vec!["\n\n".to_string(), ".\n".to_string()],
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

fn normalize(base_url: &str) -> String {
    base_url
        .trim_end_matches('/')
        .replace("/api/generate", "")
        .replace("/api/chat", "")
}

/// True when `GET /api/tags` answers 200 within `timeout`
pub async fn probe(base_url: &str, timeout: Duration) -> bool {
    let Ok(client) = Client::builder().timeout(timeout).build() else {
        return false;
    };
    let url = format!("{}/api/tags", normalize(base_url));
    match client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            debug!("Ollama probe failed: {}", e);
            false
        }
    }
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize(base_url),
        })
    }

    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                DatavaultError::ProviderUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;
        Ok(())
    }

    /// Build the request body sent to `/api/chat`
    fn chat_request(model: &str, system: &str, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: format!("{}\n\n{}", system, CONCISE_RULES),
                },
                Message {
                    role: "user".to_string(),
                    content: format!("Provide a concise response (max 50 words) to: {}", prompt),
                },
            ],
            stream: false,
            options: ChatOptions::default(),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn chat(&self, model: &str, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        debug!("Sending request to Ollama: model={}", model);

        let response = self
            .client
            .post(&url)
            .json(&Self::chat_request(model, system, prompt))
            .send()
            .await
            .map_err(|e| {
                DatavaultError::ProviderUnavailable(format!(
                    "Cannot connect to Ollama at {}: {}",
                    self.base_url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DatavaultError::Upstream {
                status: status.as_u16(),
                detail: format!("Ollama: {}", body.trim()),
            });
        }

        let result: ChatResponse = response.json().await?;
        Ok(result.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn provider(&self) -> Provider {
        Provider::Ollama
    }
}
