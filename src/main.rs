// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! datavault: news search, cache monitoring and repository housekeeping

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use datavault::cleanup::{self, CleanupConfig, Journal};
use datavault::config::AppConfig;
use datavault::db::SearchLogStore;
use datavault::llm;
use datavault::monitor::{self, CacheMonitorClient, Monitor};
use datavault::news::Article;
use datavault::search::{Debouncer, SearchApiClient, SearchHistory, SearchSession, SearchState};
use datavault::Result;

/// datavault CLI
#[derive(Parser, Debug)]
#[command(name = "datavault")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "News search, cache monitoring and repository housekeeping", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search news through the search API
    Search {
        /// Query to run once
        query: Option<String>,

        /// Read queries from stdin as they are typed, debounced
        #[arg(short, long)]
        interactive: bool,
    },

    /// Show the current top headlines
    Headlines,

    /// Local search history
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Searches logged on the server for a user
    RemoteHistory {
        /// User id (default: search.user_id from config)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Watch and manage the response cache
    Monitor {
        #[command(subcommand)]
        action: MonitorCommands,
    },

    /// Reorganize root-level files and remove duplicate collections
    Cleanup {
        #[command(subcommand)]
        action: CleanupCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show service and configuration status
    Status,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent searches, newest first
    List,

    /// Clear the search history
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MonitorCommands {
    /// Poll the cache until Ctrl+C
    Run {
        /// Poll interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Take a single snapshot
    Once,

    /// Remove every cached entry
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Purge expired and stale entries
    Optimize,

    /// Warm the cache with the configured queries
    Preload,
}

#[derive(Subcommand, Debug)]
enum CleanupCommands {
    /// Show which files would move where
    Plan {
        /// Directory to organize
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Move files according to the rules
    Run {
        /// Directory to organize
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Dry run mode (don't actually move files)
        #[arg(long)]
        dry_run: bool,
    },

    /// Reverse recent moves
    Undo {
        /// Number of moves to undo (0 for all)
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,

        /// Dry run (show what would be undone)
        #[arg(long)]
        dry_run: bool,
    },

    /// List journaled moves, newest first
    Journal {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Remove duplicate news collections
    Dedupe {
        /// Collections directory (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Dry run (report duplicates without deleting)
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the default rules to the cleanup config path
    InitRules {
        /// Force overwrite existing rules
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Search { query, interactive } => run_search(&config, query, interactive, json).await,
        Commands::Headlines => run_headlines(&config, json).await,
        Commands::History { action } => run_history_command(&config, action, json),
        Commands::RemoteHistory { user } => run_remote_history(&config, user, json).await,
        Commands::Monitor { action } => run_monitor_command(&config, action, json).await,
        Commands::Cleanup { action } => run_cleanup_command(&config, action, json),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status => run_status(&config).await,
    }
}

fn search_session(config: &AppConfig) -> Result<SearchSession> {
    let client = SearchApiClient::new(
        &config.search.api_url,
        Duration::from_secs(config.search.timeout_secs),
    )?;
    let history = SearchHistory::load(config.search.history_path.clone());
    Ok(SearchSession::new(
        client,
        history,
        Debouncer::new(config.search.debounce()),
        config.search.user_id.clone(),
    ))
}

fn print_articles(articles: &[Article], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(articles)?);
        return Ok(());
    }
    if articles.is_empty() {
        println!("No articles");
    }
    for (i, article) in articles.iter().enumerate() {
        println!("{:3}. {}", i + 1, article.title.as_deref().unwrap_or_default());
        println!("     {} | {}", article.source_name(), article.url.as_deref().unwrap_or("-"));
    }
    Ok(())
}

fn print_state(state: &SearchState, json: bool) -> Result<()> {
    if let Some(e) = &state.error {
        eprintln!("{}", e);
        return Ok(());
    }
    if !json {
        if let Some(query) = &state.query {
            println!("Results for '{}':", query);
        }
    }
    print_articles(&state.articles, json)
}

/// Run a search once, or read queries from stdin with debouncing
async fn run_search(
    config: &AppConfig,
    query: Option<String>,
    interactive: bool,
    json: bool,
) -> Result<()> {
    let session = search_session(config)?;

    if !interactive {
        let query = query.unwrap_or_default();
        let state = if query.trim().is_empty() {
            session.load_headlines().await
        } else {
            session.search(&query).await
        };
        return print_state(&state, json);
    }

    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Err(e) = print_state(&state, json) {
                error!("Failed to print results: {}", e);
            }
        }
    });

    eprintln!("Type a query and press Enter; Ctrl+D to finish.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.search_debounced(&line);
    }

    // Let the last debounced search land before exiting
    let mut last = session.subscribe();
    tokio::time::sleep(config.search.debounce()).await;
    let wait = Duration::from_secs(config.search.timeout_secs);
    let _ = tokio::time::timeout(wait, last.changed()).await;
    printer.abort();
    Ok(())
}

async fn run_headlines(config: &AppConfig, json: bool) -> Result<()> {
    let state = search_session(config)?.load_headlines().await;
    print_state(&state, json)
}

fn run_history_command(config: &AppConfig, action: HistoryCommands, json: bool) -> Result<()> {
    let mut history = SearchHistory::load(config.search.history_path.clone());

    match action {
        HistoryCommands::List => {
            if json {
                println!("{}", serde_json::to_string_pretty(history.entries())?);
            } else if history.is_empty() {
                println!("No search history");
            } else {
                println!("Recent searches ({}):", history.len());
                for entry in history.entries() {
                    println!("  {}  {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.query);
                }
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            history.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}

async fn run_remote_history(config: &AppConfig, user: Option<String>, json: bool) -> Result<()> {
    let client = SearchApiClient::new(
        &config.search.api_url,
        Duration::from_secs(config.search.timeout_secs),
    )?;
    let user = user.unwrap_or_else(|| config.search.user_id.clone());
    let logs = client.search_history(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
    } else {
        println!("Searches logged for '{}' ({}):", user, logs.len());
        for log in logs {
            println!("  {}  {}", log.timestamp.format("%Y-%m-%d %H:%M:%S"), log.query);
        }
    }
    Ok(())
}

/// Flip `tx` to true on Ctrl+C or SIGTERM
fn spawn_shutdown_listener(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = tx.send(true);
    });
}

async fn run_monitor_command(config: &AppConfig, action: MonitorCommands, json: bool) -> Result<()> {
    let client = CacheMonitorClient::new(
        &config.monitor.api_url,
        Duration::from_secs(config.search.timeout_secs),
    )?;

    match action {
        MonitorCommands::Run { interval } => {
            let interval = interval
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or_else(|| config.monitor.poll_interval());
            let mut monitor = Monitor::new(client, interval, config.monitor.chart_points);

            let (tx, rx) = watch::channel(false);
            spawn_shutdown_listener(tx);

            monitor
                .run(rx, |snapshot, series| {
                    if json {
                        match serde_json::to_string(snapshot) {
                            Ok(line) => println!("{}", line),
                            Err(e) => error!("Failed to encode snapshot: {}", e),
                        }
                    } else {
                        println!("{}", monitor::render_text(snapshot, series));
                    }
                })
                .await;
        }
        MonitorCommands::Once => {
            let mut monitor = Monitor::new(client, config.monitor.poll_interval(), 1);
            let snapshot = monitor.tick().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", monitor::render_text(&snapshot, monitor.series()));
            }
        }
        MonitorCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the cache");
                return Ok(());
            }
            let status = client.clear().await?;
            println!("{}", status.message.unwrap_or(status.status));
        }
        MonitorCommands::Optimize => {
            let report = client.optimize().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Optimized {} entries, reclaimed {} bytes in {:.2}s",
                    report.optimized_entries, report.space_saved, report.duration
                );
            }
        }
        MonitorCommands::Preload => {
            let report = client.preload().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Preloaded: {}", report.preloaded.join(", "));
                if !report.failed.is_empty() {
                    println!("Failed: {}", report.failed.join(", "));
                }
                println!("Took {:.2}s", report.duration);
            }
        }
    }

    Ok(())
}

/// Cleanup rules with datavault's own state files under `root` protected
fn cleanup_rules(config: &AppConfig, root: &Path) -> Result<CleanupConfig> {
    let mut rules = CleanupConfig::load(&config.cleanup.config_path)?;
    for path in [
        config.search.history_path.as_path(),
        config.cleanup.journal_path.as_path(),
        config.cleanup.config_path.as_path(),
        Path::new(&config.database.path),
    ] {
        rules.protect_under(root, path);
    }
    Ok(rules)
}

fn run_cleanup_command(config: &AppConfig, action: CleanupCommands, json: bool) -> Result<()> {
    let journal = Journal::new(config.cleanup.journal_path.clone());

    match action {
        CleanupCommands::Plan { root } => {
            let rules = cleanup_rules(config, &root)?;
            let plan = cleanup::plan(&root, &rules)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else if plan.is_empty() {
                println!("Nothing to move in {:?}", root);
            } else {
                println!("Planned moves ({}):", plan.moves.len());
                for planned in &plan.moves {
                    println!(
                        "  {} -> {}  [{}]",
                        planned.from.display(),
                        planned.to.display(),
                        planned.pattern
                    );
                }
                println!("Skipped: {}", plan.skipped.len());
            }
        }
        CleanupCommands::Run { root, dry_run } => {
            let rules = cleanup_rules(config, &root)?;
            let plan = cleanup::plan(&root, &rules)?;
            if dry_run {
                warn!("DRY RUN MODE - files will not be moved");
            }
            let report = cleanup::execute(&plan, &journal, dry_run)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let verb = if dry_run { "Would move" } else { "Moved" };
                for entry in &report.moved {
                    println!("  {}: {} -> {}", verb, entry.from.display(), entry.to.display());
                }
                for (path, reason) in &report.failed {
                    eprintln!("  Failed: {} ({})", path.display(), reason);
                }
                println!("Done. {} moved, {} failed.", report.moved.len(), report.failed.len());
            }
        }
        CleanupCommands::Undo { count, dry_run } => {
            let report = cleanup::undo(&journal, count, dry_run)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entry in &report.restored {
                    let verb = if dry_run { "Would restore" } else { "Restored" };
                    println!("  {}: {} -> {}", verb, entry.to.display(), entry.from.display());
                }
                for (entry, reason) in &report.skipped {
                    eprintln!("  Skip: {} ({})", entry.to.display(), reason);
                }
                println!(
                    "Done. {} restored, {} skipped.",
                    report.restored.len(),
                    report.skipped.len()
                );
            }
        }
        CleanupCommands::Journal { count } => {
            let entries = journal.recent(count)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("Move journal ({} entries):", entries.len());
                for entry in entries {
                    let status = if entry.undone { "[UNDONE]" } else { "" };
                    println!(
                        "  {} {} -> {} {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.from.display(),
                        entry.to.display(),
                        status
                    );
                }
            }
        }
        CleanupCommands::Dedupe { dir, dry_run } => {
            let dir = dir.unwrap_or_else(|| config.cleanup.collections_dir.clone());
            let report = cleanup::dedupe_collections(&dir, dry_run)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let verb = if dry_run { "Would remove" } else { "Removed" };
                for path in &report.removed {
                    println!("  {}: {}", verb, path.display());
                }
                println!(
                    "Scanned {} files, {} duplicates, {} unreadable, {} not collections.",
                    report.scanned,
                    report.removed.len(),
                    report.unreadable.len(),
                    report.skipped.len()
                );
            }
        }
        CleanupCommands::InitRules { force } => {
            let path = &config.cleanup.config_path;
            if path.exists() && !force {
                eprintln!("{:?} already exists. Use --force to overwrite", path);
                return Ok(());
            }
            CleanupConfig::default().save(path)?;
            println!("Wrote default cleanup rules to {:?}", path);
        }
    }

    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            let rules = CleanupConfig::load(&config.cleanup.config_path)?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Search API: {}", config.search.api_url);
            println!("  Cache dir: {:?}", config.cache.base_dir);
            println!("  Cleanup rules: {}", rules.file_mappings.len());
            println!("  Database: {}", config.database.path);
        }
    }

    Ok(())
}

fn key_status(var: &str) -> &'static str {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => "set",
        _ => "missing",
    }
}

async fn run_status(config: &AppConfig) -> Result<()> {
    println!("datavault v{} Status", env!("CARGO_PKG_VERSION"));
    println!("======================");

    let client = CacheMonitorClient::new(&config.monitor.api_url, Duration::from_secs(5))?;
    match client.stats().await {
        Ok(stats) => println!(
            "Search API ({}): Running, hit ratio {:.2}%",
            config.monitor.api_url, stats.hit_ratio_percent
        ),
        Err(e) => println!("Search API ({}): Error - {}", config.monitor.api_url, e),
    }

    let ollama = llm::ollama::probe(&config.llm.ollama_url, llm::PROBE_TIMEOUT).await;
    println!(
        "Ollama ({}): {}",
        config.llm.ollama_url,
        if ollama { "Running" } else { "Unavailable" }
    );

    match SearchLogStore::open(&config.database.path) {
        Ok(store) => println!("Database ({}): {} search logs", config.database.path, store.count()?),
        Err(e) => println!("Database: Error - {}", e),
    }

    println!("\nEnvironment:");
    println!("  {}: {}", config.news.api_key_env, key_status(&config.news.api_key_env));
    println!("  {}: {}", llm::OPENAI_KEY_ENV, key_status(llm::OPENAI_KEY_ENV));

    let history = SearchHistory::load(config.search.history_path.clone());
    println!("\nLocal search history: {} entries", history.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["datavault"]).is_err());
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::try_parse_from(["datavault", "search", "rust lang", "--format", "json"]).unwrap();
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Search { query, interactive } => {
                assert_eq!(query.as_deref(), Some("rust lang"));
                assert!(!interactive);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_cleanup_run() {
        let cli = Cli::try_parse_from([
            "datavault", "cleanup", "run", "--root", "/tmp/project", "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Cleanup { action: CleanupCommands::Run { root, dry_run } } => {
                assert!(dry_run);
                assert_eq!(root, PathBuf::from("/tmp/project"));
            }
            _ => panic!("Expected Cleanup Run command"),
        }
    }

    #[test]
    fn test_cli_monitor_interval() {
        let cli = Cli::try_parse_from(["datavault", "-q", "monitor", "run", "-i", "10"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Monitor { action: MonitorCommands::Run { interval } } => {
                assert_eq!(interval, Some(10));
            }
            _ => panic!("Expected Monitor Run command"),
        }
    }

    #[test]
    fn test_cli_undo_count() {
        let cli = Cli::try_parse_from(["datavault", "cleanup", "undo", "-n", "0"]).unwrap();
        match cli.command {
            Commands::Cleanup { action: CleanupCommands::Undo { count, dry_run } } => {
                assert_eq!(count, 0);
                assert!(!dry_run);
            }
            _ => panic!("Expected Cleanup Undo command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["datavault", "status", "--format", "xml"]).is_err());
    }
}
