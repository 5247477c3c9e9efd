// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Article DTOs as served by NewsAPI and the search API

use serde::{Deserialize, Serialize};

/// Placeholder NewsAPI puts in place of articles that were taken down
pub const REMOVED_PLACEHOLDER: &str = "[Removed]";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single news article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: ArticleSource,
}

/// Response shape of `/top-headlines`, `/everything` and `/api/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

fn is_usable(field: &Option<String>) -> bool {
    match field.as_deref().map(str::trim) {
        None | Some("") => false,
        Some(text) => text != REMOVED_PLACEHOLDER,
    }
}

impl Article {
    /// Whether the article has real title and description text
    pub fn is_displayable(&self) -> bool {
        is_usable(&self.title) && is_usable(&self.description)
    }

    pub fn source_name(&self) -> &str {
        self.source.name.as_deref().unwrap_or("Unknown source")
    }
}

impl NewsResponse {
    /// Drop placeholder and empty articles, keeping order
    pub fn into_displayable(self) -> Vec<Article> {
        filter_articles(self.articles)
    }
}

/// Keep only displayable articles, preserving order
pub fn filter_articles(articles: Vec<Article>) -> Vec<Article> {
    articles.into_iter().filter(Article::is_displayable).collect()
}
