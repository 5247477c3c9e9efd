// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP server: search/cache API, dashboard and monitor pages

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use minijinja::Environment;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::api::{Envelope, ErrorDetail, SearchLog, SearchRequest, StatusResponse};
use crate::cache::{CacheService, HEADLINES, SEARCH};
use crate::config::AppConfig;
use crate::dashboard::{self, random_pokemon_id, PokeApiClient};
use crate::db::SearchLogStore;
use crate::news::{filter_articles, HeadlineQuery, NewsResponse, NewsSource};
use crate::{DatavaultError, Result};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub cache: CacheService,
    pub news: Arc<dyn NewsSource>,
    pub logs: SearchLogStore,
    pub pokeapi: PokeApiClient,
    pub templates: Environment<'static>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        cache: CacheService,
        news: Arc<dyn NewsSource>,
        logs: SearchLogStore,
    ) -> Result<Self> {
        let pokeapi = PokeApiClient::new(&config.dashboard.pokeapi_url)?;
        Ok(Self {
            config,
            cache,
            news,
            logs,
            pokeapi,
            templates: dashboard::environment()?,
        })
    }

    fn default_headlines(&self) -> HeadlineQuery {
        HeadlineQuery {
            country: Some(self.config.news.country.clone()),
            ..Default::default()
        }
    }
}

/// `{detail}` error body used by the search/cache API
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: &str, cause: &DatavaultError) -> Self {
        error!("{}: {}", detail, cause);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorDetail { detail: self.detail })).into_response()
    }
}

/// `{error}` body used by the dashboard endpoints
fn dashboard_error(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "error": message.to_string() }))).into_response()
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.web.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .web
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        // Pages
        .route("/", get(index_page))
        .route("/monitor", get(monitor_page))
        // Search API
        .route("/health", get(health))
        .route("/api/top-headlines", get(api_top_headlines))
        .route("/api/search", post(api_search))
        .route("/api/log_search", post(api_log_search))
        .route("/api/search_history/:user_id", get(api_search_history))
        // Cache API
        .route("/api/cache/stats", get(api_cache_stats))
        .route("/api/cache/health", get(api_cache_health))
        .route("/api/cache/size", get(api_cache_size))
        .route("/api/cache/clear", delete(api_cache_clear))
        .route("/api/cache/optimize", post(api_cache_optimize))
        .route("/api/cache/preload", post(api_cache_preload))
        // Dashboard API
        .route("/api/news/search", get(api_news_search))
        .route("/api/news/sources", get(api_news_sources))
        .route("/api/news/refresh", get(api_news_refresh))
        .route("/api/pokemon/search", get(api_pokemon_search))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Response {
    let mut problems = Vec::new();

    let pokemon_id = random_pokemon_id(state.config.dashboard.pokemon_max_id);
    let pokemon = match state.pokeapi.fetch(&pokemon_id.to_string()).await {
        Ok(pokemon) => Some(pokemon),
        Err(e) => {
            warn!("Failed to load Pokémon {}: {}", pokemon_id, e);
            problems.push(format!("Pokémon unavailable: {}", e));
            None
        }
    };

    let articles = match state.news.top_headlines(&state.default_headlines()).await {
        Ok(news) => filter_articles(news.articles),
        Err(e) => {
            warn!("Failed to load headlines: {}", e);
            problems.push(format!("Headlines unavailable: {}", e));
            Vec::new()
        }
    };

    let sources = match state.news.sources(None).await {
        Ok(sources) => sources.sources,
        Err(e) => {
            warn!("Failed to load sources: {}", e);
            Vec::new()
        }
    };

    let error = (!problems.is_empty()).then(|| problems.join("; "));
    match dashboard::render_dashboard(
        &state.templates,
        pokemon.as_ref(),
        &articles,
        &sources,
        error.as_deref(),
    ) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Error rendering dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(format!("<h1>Error</h1><p>{}</p>", e)))
                .into_response()
        }
    }
}

async fn monitor_page(State(state): State<Arc<AppState>>) -> Response {
    let poll_ms = state.config.monitor.poll_interval_secs * 1000;
    match dashboard::render_monitor(&state.templates, poll_ms, state.config.monitor.chart_points) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Error rendering monitor: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// === Search API ===

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn api_top_headlines(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<NewsResponse>, ApiError> {
    let key = format!("top-headlines:{}", state.config.news.country);
    if let Some(cached) = state.cache.get_as::<NewsResponse>(&key, HEADLINES).await {
        info!("Returning cached headlines");
        return Ok(Json(cached));
    }

    let headlines = state
        .news
        .top_headlines(&state.default_headlines())
        .await
        .map_err(|e| ApiError::internal("Failed to fetch headlines", &e))?;

    if let Err(e) = state.cache.set_as(&key, HEADLINES, &headlines).await {
        warn!("Failed to cache headlines: {}", e);
    }
    Ok(Json(headlines))
}

async fn api_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> std::result::Result<Json<NewsResponse>, ApiError> {
    info!("Searching for: {}", request.query);
    if let Some(cached) = state.cache.get_as::<NewsResponse>(&request.query, SEARCH).await {
        info!("Returning cached response for: {}", request.query);
        return Ok(Json(cached));
    }

    info!("Cache miss - fetching from NewsAPI: {}", request.query);
    let response = state
        .news
        .everything(&request.query)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch news", &e))?;

    if let Err(e) = state.cache.set_as(&request.query, SEARCH, &response).await {
        warn!("Failed to cache search {}: {}", request.query, e);
    }
    Ok(Json(response))
}

async fn api_log_search(
    State(state): State<Arc<AppState>>,
    Json(log): Json<SearchLog>,
) -> std::result::Result<Json<StatusResponse>, ApiError> {
    state
        .logs
        .insert(&log)
        .map_err(|e| ApiError::internal("Failed to log search", &e))?;
    Ok(Json(StatusResponse::success()))
}

async fn api_search_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> std::result::Result<Json<Vec<SearchLog>>, ApiError> {
    let logs = state
        .logs
        .for_user(&user_id)
        .map_err(|e| ApiError::internal("Failed to fetch search history", &e))?;
    Ok(Json(logs))
}

// === Cache API ===

async fn api_cache_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Envelope::success(state.cache.stats()))
}

async fn api_cache_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Envelope::success(state.cache.health_report().await))
}

async fn api_cache_size(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Envelope::success(state.cache.size_info().await))
}

async fn api_cache_clear(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<StatusResponse>, ApiError> {
    state
        .cache
        .clear_all()
        .await
        .map_err(|e| ApiError::internal("Failed to clear cache", &e))?;
    Ok(Json(StatusResponse::with_message("Cache cleared successfully")))
}

async fn api_cache_optimize(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Envelope::success(state.cache.optimize().await))
}

async fn api_cache_preload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let queries = state.cache.config().preload_queries.clone();
    Json(Envelope::success(state.cache.preload(&queries, state.news.as_ref()).await))
}

// === Dashboard API ===

#[derive(Deserialize)]
struct NewsSearchParams {
    #[serde(default)]
    q: String,
    category: Option<String>,
    source: Option<String>,
}

async fn api_news_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsSearchParams>,
) -> Response {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let result = if let Some(source) = non_empty(params.source) {
        let query = HeadlineQuery { sources: Some(source), ..Default::default() };
        state.news.top_headlines(&query).await
    } else if let Some(category) = non_empty(params.category) {
        let query = HeadlineQuery { category: Some(category), ..state.default_headlines() };
        state.news.top_headlines(&query).await
    } else if params.q.trim().is_empty() {
        state.news.top_headlines(&state.default_headlines()).await
    } else {
        state.news.everything(params.q.trim()).await
    };

    match result {
        Ok(news) => displayable_json(news),
        Err(e) => {
            warn!("News search failed: {}", e);
            dashboard_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

#[derive(Deserialize)]
struct SourcesParams {
    category: Option<String>,
}

async fn api_news_sources(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourcesParams>,
) -> Response {
    match state.news.sources(params.category.as_deref()).await {
        Ok(sources) => Json(sources).into_response(),
        Err(e) => dashboard_error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn api_news_refresh(State(state): State<Arc<AppState>>) -> Response {
    match state.news.top_headlines(&state.default_headlines()).await {
        Ok(news) => displayable_json(news),
        Err(e) => dashboard_error(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Dashboard responses carry only articles the page can render
fn displayable_json(mut news: NewsResponse) -> Response {
    news.articles = filter_articles(std::mem::take(&mut news.articles));
    Json(news).into_response()
}

#[derive(Deserialize)]
struct PokemonParams {
    #[serde(default)]
    query: String,
}

async fn api_pokemon_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PokemonParams>,
) -> Response {
    match state.pokeapi.fetch(&params.query).await {
        Ok(pokemon) => Json(pokemon).into_response(),
        Err(e) => dashboard_error(StatusCode::NOT_FOUND, e),
    }
}

/// Start the web server with prepared state
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.web.host, state.config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Dashboard available at http://{}", addr);

    let router = create_router(Arc::new(state));
    axum::serve(listener, router)
        .await
        .map_err(|e| DatavaultError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
