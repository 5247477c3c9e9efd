// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Headline briefing: fetch top headlines and have a model summarize them

use std::fmt::Write as _;
use tracing::info;

use super::{ask, Exchange, LlmProvider};
use crate::config::ModelPair;
use crate::news::{filter_articles, Article, HeadlineQuery, NewsSource};
use crate::Result;

pub const SUMMARIZER_SYSTEM: &str = "You are a helpful news summarizer.";
pub const DEFAULT_LIMIT: usize = 5;

pub struct Briefing {
    pub articles: Vec<Article>,
    /// `None` when there was nothing to summarize
    pub summary: Option<Exchange>,
}

pub fn summary_prompt(articles: &[Article]) -> String {
    let mut listing = String::new();
    for (i, article) in articles.iter().enumerate() {
        if i > 0 {
            listing.push_str("\n\n");
        }
        let _ = write!(
            listing,
            "Headline: {}\nSource: {}\nDescription: {}",
            article.title.as_deref().unwrap_or_default(),
            article.source_name(),
            article.description.as_deref().unwrap_or_default(),
        );
    }

    format!(
        "Summarize these news headlines into a brief, coherent report:

{}

Please provide:
1. A brief overview
2. Key points
3. Any notable trends or patterns",
        listing
    )
}

/// Top headlines, optionally narrowed to `topic`, cut to `limit` and summarized
pub async fn brief(
    news: &dyn NewsSource,
    backend: &dyn LlmProvider,
    models: &ModelPair,
    model: Option<&str>,
    topic: Option<&str>,
    limit: usize,
) -> Result<Briefing> {
    let query = HeadlineQuery {
        q: topic.map(str::to_string),
        ..Default::default()
    };
    let mut articles = filter_articles(news.top_headlines(&query).await?.articles);
    articles.truncate(limit);
    info!("Summarizing {} headlines", articles.len());

    if articles.is_empty() {
        return Ok(Briefing { articles, summary: None });
    }

    let prompt = summary_prompt(&articles);
    let summary = ask(backend, models, model, SUMMARIZER_SYSTEM, &prompt).await?;
    Ok(Briefing { articles, summary: Some(summary) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use crate::news::article::ArticleSource;
    use crate::news::{NewsResponse, SourcesResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedNews {
        articles: Vec<Article>,
        queries: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl NewsSource for FixedNews {
        async fn top_headlines(&self, query: &HeadlineQuery) -> Result<NewsResponse> {
            self.queries.lock().unwrap().push(query.q.clone());
            Ok(NewsResponse {
                articles: self.articles.clone(),
                ..Default::default()
            })
        }

        async fn everything(&self, _q: &str) -> Result<NewsResponse> {
            Ok(NewsResponse::default())
        }

        async fn sources(&self, _category: Option<&str>) -> Result<SourcesResponse> {
            Ok(SourcesResponse::default())
        }
    }

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LlmProvider for Recorder {
        async fn chat(&self, _model: &str, system: &str, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push((system.to_string(), prompt.to_string()));
            Ok("Overview: quiet day.".to_string())
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        fn provider(&self) -> Provider {
            Provider::Ollama
        }
    }

    fn article(title: &str, source: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            description: Some(format!("{} details", title)),
            url: Some("https://news.example".to_string()),
            source: ArticleSource {
                id: None,
                name: Some(source.to_string()),
            },
            ..Default::default()
        }
    }

    fn models() -> ModelPair {
        ModelPair {
            primary: "nemotron-mini".into(),
            fallback: "llama3.2".into(),
        }
    }

    #[test]
    fn test_prompt_lists_each_article() {
        let prompt = summary_prompt(&[article("Rates held", "Wire"), article("Rain", "Local")]);
        assert!(prompt.starts_with("Summarize these news headlines"));
        assert!(prompt.contains("Headline: Rates held\nSource: Wire\nDescription: Rates held details"));
        assert!(prompt.contains("\n\nHeadline: Rain\nSource: Local"));
        assert!(prompt.ends_with("3. Any notable trends or patterns"));
    }

    #[tokio::test]
    async fn test_brief_filters_and_limits() {
        let mut removed = article("[Removed]", "x");
        removed.description = Some("[Removed]".into());
        let news = FixedNews {
            articles: vec![
                removed,
                article("One", "A"),
                article("Two", "B"),
                article("Three", "C"),
            ],
            queries: Mutex::default(),
        };
        let backend = Recorder::default();

        let briefing = brief(&news, &backend, &models(), None, Some("economy"), 2)
            .await
            .unwrap();

        let titles: Vec<_> = briefing.articles.iter().filter_map(|a| a.title.as_deref()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert_eq!(*news.queries.lock().unwrap(), vec![Some("economy".to_string())]);

        let summary = briefing.summary.unwrap();
        assert_eq!(summary.model, "nemotron-mini");
        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts[0].0, SUMMARIZER_SYSTEM);
        assert!(!prompts[0].1.contains("Three"));
    }

    #[tokio::test]
    async fn test_no_headlines_skips_model() {
        let news = FixedNews { articles: vec![], queries: Mutex::default() };
        let backend = Recorder::default();

        let briefing = brief(&news, &backend, &models(), None, None, DEFAULT_LIMIT).await.unwrap();
        assert!(briefing.summary.is_none());
        assert!(backend.prompts.lock().unwrap().is_empty());
    }
}
