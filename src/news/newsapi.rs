// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! NewsAPI client used by the server as the upstream news source

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::article::NewsResponse;
use crate::config::NewsConfig;
use crate::{DatavaultError, Result};

/// Filters for `/top-headlines`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlineQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub sources: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcesResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceInfo>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Anything that can answer news queries
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn top_headlines(&self, query: &HeadlineQuery) -> Result<NewsResponse>;

    async fn everything(&self, q: &str) -> Result<NewsResponse>;

    async fn sources(&self, category: Option<&str>) -> Result<SourcesResponse>;
}

/// Client for https://newsapi.org/v2
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
    language: String,
}

impl NewsApiClient {
    pub fn new(config: &NewsConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            country: config.country.clone(),
            language: config.language.clone(),
        })
    }

    /// Build a client from config, reading the key from the environment
    pub fn from_env(config: &NewsConfig) -> Result<Self> {
        let key = config.api_key().ok_or_else(|| {
            DatavaultError::Config(format!("{} not found in environment", config.api_key_env))
        })?;
        Self::new(config, key)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        params.push(("apiKey", self.api_key.clone()));

        debug!("NewsAPI request: {}", endpoint);

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(body);
            error!("News API error ({}): {}", status, detail);
            return Err(DatavaultError::Upstream { status: status.as_u16(), detail });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn top_headlines(&self, query: &HeadlineQuery) -> Result<NewsResponse> {
        let mut params = Vec::new();
        // NewsAPI rejects `sources` combined with `country` or `category`
        if let Some(sources) = &query.sources {
            params.push(("sources", sources.clone()));
        } else {
            let country = query.country.clone().unwrap_or_else(|| self.country.clone());
            params.push(("country", country));
            if let Some(category) = &query.category {
                params.push(("category", category.clone()));
            }
        }
        if let Some(q) = &query.q {
            params.push(("q", q.clone()));
        }
        self.request("top-headlines", params).await
    }

    async fn everything(&self, q: &str) -> Result<NewsResponse> {
        let params = vec![
            ("q", q.to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("language", self.language.clone()),
        ];
        self.request("everything", params).await
    }

    async fn sources(&self, category: Option<&str>) -> Result<SourcesResponse> {
        let mut params = vec![
            ("language", self.language.clone()),
            ("country", self.country.clone()),
        ];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        self.request("top-headlines/sources", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(url: &str) -> NewsApiClient {
        let config = NewsConfig {
            base_url: url.to_string(),
            ..Default::default()
        };
        NewsApiClient::new(&config, "secret".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_everything_sends_expected_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/everything")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "rust".into()),
                Matcher::UrlEncoded("sortBy".into(), "publishedAt".into()),
                Matcher::UrlEncoded("language".into(), "en".into()),
                Matcher::UrlEncoded("apiKey".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"ok","totalResults":0,"articles":[]}"#)
            .create_async()
            .await;

        let response = client_for(&server.url()).everything("rust").await.unwrap();
        assert_eq!(response.status.as_deref(), Some("ok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sources_query_skips_country() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sources".into(), "bbc-news".into()),
                Matcher::UrlEncoded("apiKey".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"status":"ok","articles":[]}"#)
            .create_async()
            .await;

        let query = HeadlineQuery {
            sources: Some("bbc-news".to_string()),
            ..Default::default()
        };
        client_for(&server.url()).top_headlines(&query).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_body_message_surfaces() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/top-headlines".into()))
            .with_status(401)
            .with_body(r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .top_headlines(&HeadlineQuery::default())
            .await
            .unwrap_err();
        match err {
            DatavaultError::Upstream { status, detail } => {
                assert_eq!(status, 401);
                assert_eq!(detail, "Your API key is invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
