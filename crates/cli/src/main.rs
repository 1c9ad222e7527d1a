use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use shelfwise_core::book::read_book_list;
use shelfwise_core::config::{config_path, load_config, load_config_from, save_config, set_config_key, AppConfig};
use shelfwise_core::cover::{CoverResolver, CoverStatsSnapshot};
use shelfwise_core::error::{ConfigError, ShelfError};
use shelfwise_core::progress::ProgressEvent;

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "shelfwise")]
#[command(about = "Find real cover images for the books on a reading list")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the cover for one book
    Cover {
        /// Book title
        #[arg(long)]
        title: String,

        /// Book author
        #[arg(long, default_value = "")]
        author: String,

        /// Cover currently shown for the book (placeholder or own image)
        #[arg(long)]
        fallback: Option<String>,
    },

    /// Resolve covers for every book in a reading-list JSON export
    Covers {
        /// JSON file containing an array of books
        #[arg(required = true)]
        input: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize default config file
    Init,
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key (dot-separated path, e.g. covers.prefetch_concurrency)
        key: String,
        /// Value
        value: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Cover { title, author, fallback } => run_cover(title, author, fallback.as_deref(), cli.json).await,
        Commands::Covers { input } => run_covers(input, cli.json).await,
        Commands::Config { action } => run_config(action, cli.json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_resolver() -> Result<CoverResolver, ShelfError> {
    let cfg = load_config();
    let resolver = CoverResolver::from_config(&cfg.covers)?;
    tracing::debug!(providers = ?resolver.provider_names(), "Cover resolver ready");
    Ok(resolver)
}

async fn run_cover(title: &str, author: &str, fallback: Option<&str>, json: bool) -> CliResult {
    let resolver = build_resolver()?;
    let cover = resolver.resolve(title, author, fallback).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&cover)?);
    } else {
        println!("Cover: {}", cover.cover_url.as_deref().unwrap_or("(none)"));
        println!("Real cover: {}", if cover.is_real_cover { "yes" } else { "no" });
    }
    Ok(())
}

async fn run_covers(input: &str, json: bool) -> CliResult {
    let path = Path::new(input);
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    let books = read_book_list(path).map_err(ShelfError::from)?;
    let resolver = build_resolver()?;

    let bar = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(books.len() as u64)
    };
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}")?.progress_chars("=> "),
    );
    let on_progress = |e: ProgressEvent| {
        bar.set_position(e.current);
        if let Some(title) = e.message {
            bar.set_message(title);
        }
    };
    let covers = resolver.resolve_books(&books, Some(&on_progress)).await;
    bar.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&covers)?);
        return Ok(());
    }
    for (book, c) in books.iter().zip(&covers) {
        let marker = if c.cover.is_real_cover { "found" } else { "none " };
        println!(
            "[{}] {} - {}: {}",
            marker,
            book.author,
            book.title,
            c.cover.cover_url.as_deref().unwrap_or("-")
        );
    }
    print_stats(&resolver.stats());
    Ok(())
}

fn print_stats(s: &CoverStatsSnapshot) {
    println!(
        "{} lookups ({} resolved, {} not found), {} cache hits, {} shared, {} provider failures",
        s.lookups, s.resolved, s.not_found, s.cache_hits, s.coalesced, s.provider_failures
    );
}

fn run_config(action: &ConfigAction, json: bool) -> CliResult {
    match action {
        ConfigAction::Init => {
            let path = config_path().ok_or(ConfigError::NoConfigDir)?;
            save_config(&path, &AppConfig::default())?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Show => {
            let cfg = load_config();
            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else {
                println!("{}", toml::to_string_pretty(&cfg)?);
            }
        }
        ConfigAction::Set { key, value } => {
            let path = config_path().ok_or(ConfigError::NoConfigDir)?;
            let mut cfg = if path.exists() {
                load_config_from(&path)?
            } else {
                AppConfig::default()
            };
            set_config_key(&mut cfg, key, value)?;
            save_config(&path, &cfg)?;
            if !json {
                println!("Updated {}", key);
            }
        }
    }
    Ok(())
}
