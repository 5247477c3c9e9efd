// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! novatool: ask a local or hosted LLM from the terminal

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use datavault::config::AppConfig;
use datavault::llm::{
    self, AiHistory, AiHistoryEntry, DirectoryContext, ListedEntry, Provider, Transcript,
};
use datavault::news::NewsApiClient;
use datavault::Result;

#[derive(Parser, Debug)]
#[command(name = "novatool")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Concise answers from Ollama or OpenAI", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question
    Ask {
        /// The prompt
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Provider (ollama or openai); detected when omitted
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Model name; the provider's primary then fallback when omitted
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt (default: built from the working directory)
        #[arg(short, long)]
        system: Option<String>,

        /// Write a Markdown transcript to the outputs directory
        #[arg(long)]
        save: bool,

        /// Do not append to ai_history.json
        #[arg(long)]
        no_history: bool,
    },

    /// Show past exchanges, newest first
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Print full responses
        #[arg(long)]
        full: bool,
    },

    /// Fetch top headlines and summarize them
    News {
        /// Topic to narrow the headlines to
        #[arg(short, long)]
        topic: Option<String>,

        /// Number of articles to summarize
        #[arg(short, long, default_value_t = llm::briefing::DEFAULT_LIMIT)]
        limit: usize,

        /// Provider (ollama or openai); detected when omitted
        #[arg(short, long)]
        provider: Option<Provider>,

        /// Model name; the provider's primary then fallback when omitted
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List a directory and save the listing to the outputs directory
    List {
        /// Directory to list
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include hidden entries
        #[arg(long)]
        show_hidden: bool,

        /// Show file sizes
        #[arg(short = 'S', long)]
        show_size: bool,

        /// Show hidden entries and sizes
        #[arg(short, long)]
        all: bool,

        /// Do not save the listing
        #[arg(long)]
        no_save: bool,
    },

    /// List models available on a provider
    Models {
        /// Provider (ollama or openai); detected when omitted
        #[arg(short, long)]
        provider: Option<Provider>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Ask {
            prompt,
            provider,
            model,
            system,
            save,
            no_history,
        } => {
            let prompt = prompt.join(" ");
            run_ask(&config, &prompt, provider, model, system, save, !no_history).await
        }
        Commands::History { limit, full } => run_history(&config, limit, full),
        Commands::Models { provider } => run_models(&config, provider).await,
        Commands::News {
            topic,
            limit,
            provider,
            model,
        } => run_news(&config, topic, limit, provider, model).await,
        Commands::List {
            path,
            show_hidden,
            show_size,
            all,
            no_save,
        } => run_list(&config, &path, show_hidden || all, show_size || all, !no_save).await,
    }
}

async fn run_ask(
    config: &AppConfig,
    prompt: &str,
    provider: Option<Provider>,
    model: Option<String>,
    system: Option<String>,
    save: bool,
    record: bool,
) -> Result<()> {
    let llm_config = &config.llm;
    let write_transcript = save || llm_config.transcripts;
    let command = format!("ask {}", prompt);

    let system = match system {
        Some(system) => system,
        None => {
            let cwd = std::env::current_dir()?;
            llm::system_prompt(&DirectoryContext::gather(&cwd).await)
        }
    };

    let provider = llm::select_provider(provider, llm_config).await;
    info!("Using provider {}", provider);

    let result = match llm::build_provider(provider, llm_config) {
        Ok(backend) => {
            llm::ask(
                backend.as_ref(),
                provider.models(llm_config),
                model.as_deref(),
                &system,
                prompt,
            )
            .await
        }
        Err(e) => Err(e),
    };

    let exchange = match result {
        Ok(exchange) => exchange,
        Err(e) => {
            error!("{} request failed: {}", provider, e);
            if write_transcript {
                Transcript::failed(&command, provider.as_str(), &e.to_string())
                    .save(&llm_config.outputs_dir)?;
            }
            return Err(e);
        }
    };

    println!("{}", exchange.response);
    println!(
        "\n[{} | {} | {:.2}s | {} words]",
        exchange.provider,
        exchange.model,
        exchange.elapsed.as_secs_f64(),
        exchange.words()
    );

    if record {
        AiHistory::in_dir(&llm_config.outputs_dir).append(AiHistoryEntry::from(&exchange))?;
    }
    if write_transcript {
        let path = Transcript::from_exchange(&command, &exchange).save(&llm_config.outputs_dir)?;
        println!("Transcript: {}", path.display());
    }

    Ok(())
}

fn run_history(config: &AppConfig, limit: usize, full: bool) -> Result<()> {
    let history = AiHistory::in_dir(&config.llm.outputs_dir);
    let entries = history.recent(limit)?;

    if entries.is_empty() {
        println!("No history at {:?}", history.path());
        return Ok(());
    }

    for entry in entries {
        println!(
            "[{}] {} / {} ({}, {} words)",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.provider,
            entry.model,
            entry.time,
            entry.words
        );
        println!("Q: {}", entry.prompt);
        if full {
            println!("A: {}\n", entry.response);
        } else {
            println!("A: {}\n", entry.preview());
        }
    }

    Ok(())
}

async fn run_models(config: &AppConfig, provider: Option<Provider>) -> Result<()> {
    let provider = llm::select_provider(provider, &config.llm).await;
    let backend = llm::build_provider(provider, &config.llm)?;
    let models = backend.list_models().await?;

    println!("{} models ({}):", provider, models.len());
    for model in models {
        println!("  {}", model);
    }
    Ok(())
}

async fn run_news(
    config: &AppConfig,
    topic: Option<String>,
    limit: usize,
    provider: Option<Provider>,
    model: Option<String>,
) -> Result<()> {
    let news = NewsApiClient::from_env(&config.news)?;
    let provider = llm::select_provider(provider, &config.llm).await;
    let backend = llm::build_provider(provider, &config.llm)?;

    match &topic {
        Some(topic) => println!("Fetching news about {}...", topic),
        None => println!("Fetching news..."),
    }
    let briefing = llm::brief(
        &news,
        backend.as_ref(),
        provider.models(&config.llm),
        model.as_deref(),
        topic.as_deref(),
        limit,
    )
    .await?;

    let Some(summary) = briefing.summary else {
        println!("No headlines found.");
        return Ok(());
    };

    println!("\nLatest Headlines:");
    for (i, article) in briefing.articles.iter().enumerate() {
        println!("\n{}. {}", i + 1, article.title.as_deref().unwrap_or_default());
        println!("   Source: {}", article.source_name());
        if let Some(description) = &article.description {
            println!("   {}", description);
        }
    }

    let rule = "\u{2500}".repeat(50);
    println!("\nAI Summary Report\n{}", rule);
    println!("Generated on {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Using {} with model {}\n", summary.provider, summary.model);
    println!("{}\n{}", summary.response, rule);

    AiHistory::in_dir(&config.llm.outputs_dir).append(AiHistoryEntry::from(&summary))?;
    Ok(())
}

fn print_entries(entries: &[ListedEntry], show_size: bool) {
    for entry in entries {
        let kind = if entry.is_file { "file" } else { "dir " };
        if show_size && entry.is_file {
            println!("{} {} ({})", kind, entry.name, llm::format_size(entry.size));
        } else {
            println!("{} {}", kind, entry.name);
        }
    }
}

async fn run_list(
    config: &AppConfig,
    path: &std::path::Path,
    show_hidden: bool,
    show_size: bool,
    save: bool,
) -> Result<()> {
    let listing = llm::list_directory(path).await?;
    println!("Listing files in: {}\n", listing.root.display());
    print_entries(&listing.visible, show_size);

    if show_hidden && !listing.hidden.is_empty() {
        println!("\nHidden files and directories:");
        print_entries(&listing.hidden, show_size);
    }

    if save {
        let saved = listing.save(&config.llm.outputs_dir, show_hidden)?;
        println!("\nFile list saved to: {}", saved.display());
    }
    Ok(())
}
