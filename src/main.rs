//! A3S Metasearch CLI - metasearch aggregation from the command line.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use a3s_metasearch::{
    engines::{Bookmarks, DuckDuckGo, Wikipedia},
    AnyEngine, Config, EngineCategory, MetaSearch, SearchQuery, SearchResponse,
};

/// A3S Metasearch - Embeddable metasearch engine CLI
#[derive(Parser)]
#[command(name = "a3s-metasearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bookmarks file (JSON array) served by the offline bookmarks engine
    #[arg(long, global = true)]
    bookmarks: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search using the metasearch engine
    Search(SearchArgs),

    /// List registered search engines
    Engines,

    /// Run only the instant answerers
    Answer {
        /// Query to answer
        query: String,
    },

    /// List plugins and whether they are enabled by default
    Plugins,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query; supports `!bang` and `:locale` tokens
    query: String,

    /// Engines to use by name (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    engines: Option<Vec<String>>,

    /// Categories to search (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    categories: Option<Vec<String>>,

    /// Page number
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Results per page requested from each engine
    #[arg(long)]
    page_size: Option<usize>,

    /// Search timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let search = build_search(&cli)?;

    match cli.command {
        Commands::Search(args) => run_search(&search, args).await,
        Commands::Engines => list_engines(&search),
        Commands::Answer { query } => run_answer(&search, &query),
        Commands::Plugins => list_plugins(&search),
    }
}

fn build_search(cli: &Cli) -> Result<MetaSearch> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let search = MetaSearch::with_config(config)?;

    search.register_engine(AnyEngine::online(Wikipedia::new()))?;
    search.register_engine(AnyEngine::online(DuckDuckGo::new()))?;
    if let Some(path) = &cli.bookmarks {
        let bookmarks = Bookmarks::from_file(path)
            .with_context(|| format!("Failed to load bookmarks {}", path.display()))?;
        search.register_engine(AnyEngine::offline(bookmarks))?;
    }
    Ok(search)
}

fn list_engines(search: &MetaSearch) -> Result<()> {
    println!("Available search engines:\n");
    for engine in search.engines() {
        let config = engine.config();
        let categories: Vec<_> = config.categories.iter().map(|c| c.as_str()).collect();
        println!(
            "  {:<12} !{:<6} {:?} [{}]{}",
            config.name,
            config.shortcut,
            engine.kind(),
            categories.join(", "),
            if config.enabled { "" } else { " (disabled)" }
        );
    }
    println!();
    println!("Usage: a3s-metasearch search \"!wp rust\" or -e wikipedia,duckduckgo");
    Ok(())
}

fn list_plugins(search: &MetaSearch) -> Result<()> {
    println!("Plugins:\n");
    for (info, enabled) in search.plugins().list() {
        println!(
            "  [{}] {:<20} {}",
            if enabled { "x" } else { " " },
            info.id,
            info.description
        );
    }
    Ok(())
}

fn run_answer(search: &MetaSearch, query: &str) -> Result<()> {
    let answers = search.answerers().ask(query);
    if answers.is_empty() {
        println!("No answer for \"{}\"", query);
    }
    for answer in answers {
        println!("{}", answer.answer);
    }
    Ok(())
}

async fn run_search(search: &MetaSearch, args: SearchArgs) -> Result<()> {
    let parsed = search.parse_query(&args.query);
    for bang in &parsed.unknown_bangs {
        eprintln!("Warning: Unknown bang '!{}'", bang);
    }

    let mut query = SearchQuery::default().with_page(args.page);
    if let Some(engines) = args.engines {
        query = query.with_engines(engines);
    }
    if let Some(names) = args.categories {
        let mut categories = Vec::new();
        for name in names {
            match EngineCategory::from_shortcut(&name) {
                Some(category) => categories.push(category),
                None => eprintln!("Warning: Unknown category '{}', skipping", name),
            }
        }
        query = query.with_categories(categories);
    }
    if let Some(size) = args.page_size {
        query = query.with_page_size(size);
    }
    if let Some(secs) = args.timeout {
        query = query.with_timeout(Duration::from_secs(secs));
    }
    let query = parsed.apply(query);

    let response = search.search(query).await?;
    print_response(&response, args.format)
}

fn print_response(response: &SearchResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!(
                "\nSearch results for \"{}\" (page {}, {} results in {}ms):\n",
                response.query,
                response.page,
                response.count(),
                response.duration_ms
            );

            for answer in &response.answers {
                println!("  > {}", answer.answer);
            }
            for infobox in &response.infoboxes {
                println!("  [{}] {}", infobox.title, infobox.content);
            }
            if !response.answers.is_empty() || !response.infoboxes.is_empty() {
                println!();
            }

            for (i, result) in response.results.iter().enumerate() {
                println!("{}. {}", i + 1, result.title);
                println!("   URL: {}", result.url);
                if !result.content.is_empty() {
                    let content = if result.content.chars().count() > 150 {
                        format!("{}...", result.content.chars().take(150).collect::<String>())
                    } else {
                        result.content.clone()
                    };
                    println!("   {}", content);
                }
                println!(
                    "   Engines: {:?} | Score: {:.2}",
                    result.engines, result.score
                );
                println!();
            }

            if !response.suggestions.is_empty() {
                println!("Suggestions: {}", response.suggestions.join(", "));
            }
            for engine in &response.unresponsive {
                let state = if engine.suspended { "suspended" } else { "failed" };
                eprintln!("Engine {} {}: {}", engine.engine, state, engine.reason);
            }
            if response.has_more {
                println!("More results: --page {}", response.page + 1);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputFormat::Compact => {
            for result in &response.results {
                println!("{}\t{}", result.title, result.url);
            }
        }
    }

    Ok(())
}
