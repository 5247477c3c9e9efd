// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Client for the `/api/cache/*` endpoints

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::{
    CacheStats, Envelope, HealthReport, OptimizeReport, PreloadReport, SizeInfo, StatusResponse,
};
use crate::search::client::check;
use crate::Result;

#[derive(Clone)]
pub struct CacheMonitorClient {
    client: Client,
    base_url: String,
}

impl CacheMonitorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn unwrap_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let envelope: Envelope<T> = check(response).await?.json().await?;
        Ok(envelope.data)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/cache/{}", self.base_url, path)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        Self::unwrap_data(self.client.get(self.url("stats")).send().await?).await
    }

    pub async fn health(&self) -> Result<HealthReport> {
        Self::unwrap_data(self.client.get(self.url("health")).send().await?).await
    }

    pub async fn size(&self) -> Result<SizeInfo> {
        Self::unwrap_data(self.client.get(self.url("size")).send().await?).await
    }

    pub async fn clear(&self) -> Result<StatusResponse> {
        let response = self.client.delete(self.url("clear")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn optimize(&self) -> Result<OptimizeReport> {
        Self::unwrap_data(self.client.post(self.url("optimize")).send().await?).await
    }

    pub async fn preload(&self) -> Result<PreloadReport> {
        Self::unwrap_data(self.client.post(self.url("preload")).send().await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_envelope_unwrapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/cache/size")
            .with_status(200)
            .with_body(
                r#"{"status":"success","data":{"current_size":512,"max_size":1024,"usage_percent":50.0,"items_count":3}}"#,
            )
            .create_async()
            .await;

        let client = CacheMonitorClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let size = client.size().await.unwrap();
        assert_eq!(size.items_count, 3);
        assert_eq!(size.usage_percent, 50.0);
    }

    #[tokio::test]
    async fn test_clear_uses_delete() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/cache/clear")
            .with_status(200)
            .with_body(r#"{"status":"success","message":"Cache cleared successfully"}"#)
            .create_async()
            .await;

        let client = CacheMonitorClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let status = client.clear().await.unwrap();
        assert_eq!(status.message.as_deref(), Some("Cache cleared successfully"));
        mock.assert_async().await;
    }
}
