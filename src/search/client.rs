// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the search API (`/api/search`, `/api/top-headlines`, ...)

use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::api::{ErrorDetail, SearchLog, SearchRequest, StatusResponse};
use crate::news::NewsResponse;
use crate::{DatavaultError, Result};

/// Client for the search API served by `datavault-web`
#[derive(Clone)]
pub struct SearchApiClient {
    client: Client,
    base_url: String,
}

impl SearchApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn top_headlines(&self) -> Result<NewsResponse> {
        debug!("Fetching top headlines");
        let response = self.client.get(self.url("/api/top-headlines")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn search(&self, query: &str) -> Result<NewsResponse> {
        debug!("Searching for: {}", query);
        let response = self
            .client
            .post(self.url("/api/search"))
            .json(&SearchRequest { query: query.to_string() })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn log_search(
        &self,
        user_id: &str,
        query: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<StatusResponse> {
        let log = SearchLog {
            user_id: user_id.to_string(),
            query: query.to_string(),
            timestamp,
        };
        let response = self.client.post(self.url("/api/log_search")).json(&log).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn search_history(&self, user_id: &str) -> Result<Vec<SearchLog>> {
        let response = self
            .client
            .get(self.url(&format!("/api/search_history/{}", user_id)))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turn a non-2xx response into an error carrying the server's `detail`
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorDetail>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    Err(DatavaultError::Upstream { status: status.as_u16(), detail })
}
