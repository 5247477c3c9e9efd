// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! News articles and the upstream NewsAPI client

pub mod article;
pub mod newsapi;

pub use article::{filter_articles, Article, NewsResponse};
pub use newsapi::{HeadlineQuery, NewsApiClient, NewsSource, SourcesResponse};
