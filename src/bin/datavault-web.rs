// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! datavault web server
//!
//! Serves the search API, cache endpoints and the dashboard pages.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use datavault::cache;
use datavault::config::AppConfig;
use datavault::db::SearchLogStore;
use datavault::news::{NewsApiClient, NewsSource};
use datavault::web::{self, AppState};
use datavault::Result;

#[derive(Parser, Debug)]
#[command(name = "datavault-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "datavault search API and dashboard server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open browser automatically
    #[arg(long)]
    open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("datavault web v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }
    config.validate()?;

    let news: Arc<dyn NewsSource> = match NewsApiClient::from_env(&config.news) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Cannot start without a NewsAPI key: {}", e);
            return Err(e);
        }
    };

    let cache = cache::open(config.cache.clone()).await?;
    info!("Cache directory: {:?}", config.cache.base_dir);

    let logs = SearchLogStore::open(&config.database.path)?;
    info!("Database: {}", config.database.path);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    if args.open {
        let url = format!("http://{}", addr);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    let state = AppState::new(config, cache, news, logs)?;
    web::start_server(state).await
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }
    Ok(())
}
