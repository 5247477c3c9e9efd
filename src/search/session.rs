// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Search session: debounced queries, displayed results and history

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::client::SearchApiClient;
use super::debounce::Debouncer;
use super::history::{SearchHistory, SearchHistoryEntry};
use crate::news::{Article, NewsResponse};
use crate::Result;

/// What the user currently sees
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub articles: Vec<Article>,
    pub error: Option<String>,
    pub query: Option<String>,
    /// Generation of the request that produced this state
    pub generation: u64,
}

struct Inner {
    client: SearchApiClient,
    history: Mutex<SearchHistory>,
    state: watch::Sender<SearchState>,
    generation: AtomicU64,
    user_id: String,
}

/// Ties the API client, history and displayed state together
#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<Inner>,
    debouncer: Arc<Debouncer>,
}

impl SearchSession {
    pub fn new(
        client: SearchApiClient,
        history: SearchHistory,
        debouncer: Debouncer,
        user_id: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(Inner {
                client,
                history: Mutex::new(history),
                state,
                generation: AtomicU64::new(0),
                user_id: user_id.into(),
            }),
            debouncer: Arc::new(debouncer),
        }
    }

    /// Receive a notification every time the displayed state changes
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    pub fn history(&self) -> Vec<SearchHistoryEntry> {
        self.lock_history().entries().to_vec()
    }

    pub fn clear_history(&self) -> Result<()> {
        self.lock_history().clear()
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, SearchHistory> {
        self.inner.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Schedule a search after the debounce window
    pub fn search_debounced(&self, query: &str) {
        let session = self.clone();
        let query = query.to_string();
        self.debouncer.call(move || async move {
            session.search(&query).await;
        });
    }

    /// Run a search now and apply its result
    pub async fn search(&self, query: &str) -> SearchState {
        let query = query.trim().to_string();
        let generation = self.next_generation();

        if query.is_empty() {
            self.apply(generation, None, Ok(NewsResponse::default()));
            return self.state();
        }

        let result = self.inner.client.search(&query).await;
        let succeeded = result.is_ok();
        self.apply(generation, Some(query.clone()), result);

        if succeeded {
            if let Err(e) = self.lock_history().add(&query) {
                warn!("Failed to save search history: {}", e);
            }
            if let Err(e) = self
                .inner
                .client
                .log_search(&self.inner.user_id, &query, Utc::now())
                .await
            {
                debug!("Failed to log search remotely: {}", e);
            }
        }

        self.state()
    }

    /// Load the top headlines into the displayed state
    pub async fn load_headlines(&self) -> SearchState {
        let generation = self.next_generation();
        let result = self.inner.client.top_headlines().await;
        self.apply(generation, None, result);
        self.state()
    }

    /// Replace the displayed state unless a newer request already did
    fn apply(&self, generation: u64, query: Option<String>, result: Result<NewsResponse>) -> bool {
        self.inner.state.send_if_modified(|state| {
            if generation < state.generation {
                debug!("Dropping stale result (generation {} < {})", generation, state.generation);
                return false;
            }
            state.generation = generation;
            state.query = query;
            match result {
                Ok(response) => {
                    state.articles = response.into_displayable();
                    state.error = None;
                    info!("Showing {} articles", state.articles.len());
                }
                Err(e) => {
                    error!("Search failed: {}", e);
                    state.articles.clear();
                    state.error = Some(format!("Failed to fetch news: {}", e));
                }
            }
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatavaultError, Result};
    use std::time::Duration;

    fn session(url: &str, dir: &std::path::Path) -> SearchSession {
        let client = SearchApiClient::new(url, Duration::from_secs(5)).unwrap();
        let history = SearchHistory::load(dir.join("history.json"));
        SearchSession::new(client, history, Debouncer::default(), "tester")
    }

    fn response(titles: &[&str]) -> Result<NewsResponse> {
        let articles = titles
            .iter()
            .map(|t| Article {
                title: Some(t.to_string()),
                description: Some("body".to_string()),
                ..Default::default()
            })
            .collect();
        Ok(NewsResponse { articles, ..Default::default() })
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let session = session("http://127.0.0.1:9", dir.path());

        let older = session.next_generation();
        let newer = session.next_generation();

        assert!(session.apply(newer, Some("new".into()), response(&["fresh"])));
        assert!(!session.apply(older, Some("old".into()), response(&["stale"])));

        let state = session.state();
        assert_eq!(state.query.as_deref(), Some("new"));
        assert_eq!(state.articles[0].title.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_error_clears_articles() {
        let dir = tempfile::tempdir().unwrap();
        let session = session("http://127.0.0.1:9", dir.path());

        let first = session.next_generation();
        session.apply(first, None, response(&["a", "b"]));
        let second = session.next_generation();
        session.apply(
            second,
            Some("q".into()),
            Err(DatavaultError::Upstream { status: 500, detail: "boom".into() }),
        );

        let state = session.state();
        assert!(state.articles.is_empty());
        assert!(state.error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_search_records_history_and_filters() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/search")
            .with_status(200)
            .with_body(
                r#"{"articles":[
                    {"title":"kept","description":"d"},
                    {"title":"[Removed]","description":"[Removed]"}
                ]}"#,
            )
            .create_async()
            .await;
        server
            .mock("POST", "/api/log_search")
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session = session(&server.url(), dir.path());
        let state = session.search("rust").await;

        assert_eq!(state.articles.len(), 1);
        assert!(state.error.is_none());
        assert_eq!(session.history()[0].query, "rust");
    }

    #[tokio::test]
    async fn test_unreachable_server_sets_error() {
        let dir = tempfile::tempdir().unwrap();
        let session = session("http://127.0.0.1:9", dir.path());
        let state = session.search("rust").await;
        assert!(state.articles.is_empty());
        assert!(state.error.is_some());
        assert!(session.history().is_empty());
        assert!(!dir.path().join("history.json").exists());
    }
}
