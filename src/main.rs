use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use urlindex::engine::HistoryIndex;
use urlindex::index::JsonlSource;
use urlindex::index::stats::show_stats;
use urlindex::output::{print_json, print_matches};
use urlindex::service::IndexService;
use urlindex::utils::{AppConfig, cache_file_path};

#[derive(Parser)]
#[command(name = "urlindex")]
#[command(about = "Instant address-bar completions from browsing history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Profile directory holding the history cache
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a JSON-lines history export and write the cache
    Import {
        /// One JSON object per line: {"id", "url", "title", "visit_count", "typed_count", "last_visit"}
        file: PathBuf,
    },
    /// Rank history entries for what was typed
    Search {
        /// Typed text; words are joined with spaces. Put `--` before text starting with `-`
        #[arg(required = true)]
        query: Vec<String>,

        /// Show at most this many matches
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,

        #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
        color: ColorMode,
    },
    /// Show cache statistics
    Stats,
    /// Print the cache file location
    Path,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorMode {
    Auto,
    Never,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("URLINDEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let profile_dir = config.resolve_profile_dir(cli.profile.as_deref())?;

    match cli.command {
        Commands::Import { file } => import(&config, &profile_dir, &file)?,
        Commands::Search {
            query,
            limit,
            json,
            color,
        } => search(&config, &profile_dir, &query.join(" "), limit, json, color)?,
        Commands::Stats => show_stats(&profile_dir)?,
        Commands::Path => println!("{}", cache_file_path(&profile_dir).display()),
    }

    Ok(())
}

fn import(config: &AppConfig, profile_dir: &Path, file: &Path) -> Result<()> {
    std::fs::create_dir_all(profile_dir)
        .with_context(|| format!("Failed to create profile directory {}", profile_dir.display()))?;

    let mut index = HistoryIndex::with_profile_dir(config.index.clone(), profile_dir);
    index.set_show_progress(std::io::stderr().is_terminal());
    let service = IndexService::spawn(index);

    let report = service
        .init(JsonlSource::new(file), &config.languages)?
        .recv()
        .context("Index worker stopped during import")?;
    if report.backend_unavailable {
        bail!("Could not read history from {}", file.display());
    }

    let path = service
        .persist()?
        .context("Index was not ready to persist")?;
    println!(
        "Indexed {} rows ({} skipped) into {}",
        report.indexed,
        report.skipped,
        path.display()
    );
    Ok(())
}

fn search(
    config: &AppConfig,
    profile_dir: &Path,
    text: &str,
    limit: Option<usize>,
    json: bool,
    color: ColorMode,
) -> Result<()> {
    let mut index = HistoryIndex::with_profile_dir(config.index.clone(), profile_dir);
    if !index.load()? {
        bail!(
            "No history cache at {}. Run 'urlindex import <FILE>' first",
            cache_file_path(profile_dir).display()
        );
    }

    let mut matches = index.search(text);
    if let Some(limit) = limit {
        matches.truncate(limit);
    }

    if json {
        print_json(&matches)?;
    } else {
        print_matches(&matches, matches!(color, ColorMode::Auto))?;
    }
    Ok(())
}
