//! sysadmin-agent
//!
//! Ask questions about this machine from the terminal.

#![forbid(unsafe_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sysadmin_agent::cache::CacheManager;
use sysadmin_agent::cli::{embedder, patterns_table, App, Console, Indexer, Shell};
use sysadmin_agent::config::{AgentPattern, Settings};
use sysadmin_agent::knowledge::{TextSplitter, VectorStore};
use sysadmin_agent::system::SystemDataCollector;

/// AI system administrator assistant
#[derive(Parser, Debug)]
#[command(name = "sysadmin-agent", version, about, long_about = None)]
struct Args {
    /// Agent pattern (react, plan_execute, multi_agent, conversational, self_ask)
    #[arg(long, global = true)]
    pattern: Option<AgentPattern>,

    /// Do not re-index the system in the background
    #[arg(long, global = true)]
    no_background: bool,

    /// Do not read or write the answer cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive shell (default)
    Chat,
    /// Answer one question and exit
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Take a system snapshot and index it
    Collect,
    /// Inspect or clear the answer cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List the agent patterns
    Patterns,
    /// Create the data directories and a .env template
    Init,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    Status,
    ClearExpired,
    ClearAll,
}

const ENV_TEMPLATE: &str = "\
# Gemini credentials: set an API key, or a project for Vertex AI (uses ADC)
GEMINI_API_KEY=
# GCP_PROJECT_ID=
# GCP_LOCATION=us-central1

GEMINI_MODEL=gemini-2.0-flash
DEFAULT_AGENT_PATTERN=plan_execute
AGENT_MODE=interactive
MAX_ITERATIONS=10
TEMPERATURE=0.1

VECTOR_DB_PATH=data/vector_db
EMBEDDING_BACKEND=gemini
EMBEDDING_MODEL=text-embedding-004

ENABLE_BACKGROUND_COLLECTION=true
COLLECTION_INTERVAL_HOURS=1
DATA_RETENTION_DAYS=7
REQUIRE_CONFIRMATION=true
SAFE_MODE=true
ALLOWED_COMMANDS=ps,top,free,df,uptime,whoami

ENABLE_SPECIALIST_AGENTS=true
AGENT_COLLABORATION_MODE=hierarchical
ENABLE_CACHING=true
CACHE_TTL_SECONDS=300
DEBUG=false
";

fn init_tracing(debug: bool) {
    let default = if debug {
        "warn,sysadmin_agent=debug"
    } else {
        "warn,sysadmin_agent=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if let Some(pattern) = args.pattern {
        settings.default_agent_pattern = pattern;
    }
    if args.no_background {
        settings.enable_background_collection = false;
    }
    if args.no_cache {
        settings.enable_caching = false;
    }
    init_tracing(args.verbose || settings.debug);

    match args.command.unwrap_or(Command::Chat) {
        Command::Chat => chat(settings).await,
        Command::Ask { question } => ask(settings, &question.join(" ")).await,
        Command::Collect => collect(settings).await,
        Command::Cache { action } => cache(settings, action).await,
        Command::Patterns => {
            println!("{}", patterns_table(settings.default_agent_pattern));
            Ok(())
        }
        Command::Init => init(&settings).await,
    }
}

async fn chat(settings: Settings) -> Result<()> {
    let console = Arc::new(Console::new());
    let pattern = settings.default_agent_pattern;
    let app = App::build(settings, console.clone())
        .await
        .context("Could not start the assistant")?;
    let mut shell = Shell::new(app, console, pattern).await?;
    shell.run().await?;
    Ok(())
}

async fn ask(settings: Settings, question: &str) -> Result<()> {
    let console = Arc::new(Console::new());
    let pattern = settings.default_agent_pattern;
    let app = App::build(settings, console)
        .await
        .context("Could not start the assistant")?;
    let mut strategy = app.strategy(pattern)?;

    let outcome = strategy.execute_query(question).await;
    if outcome.error {
        bail!(outcome.output);
    }
    println!("{}", outcome.output);
    Ok(())
}

async fn collect(settings: Settings) -> Result<()> {
    let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap);
    let store = VectorStore::open(settings.collection_path(), embedder(&settings).await?, splitter)
        .await?;
    let indexer = Indexer::new(
        SystemDataCollector::new(settings.max_log_entries),
        Arc::new(store),
    );
    let chunks = indexer.collect("manual").await?;
    println!("✓ Indexed {} chunks into {}", chunks, settings.collection_path().display());
    Ok(())
}

async fn cache(settings: Settings, action: CacheAction) -> Result<()> {
    let cache = CacheManager::new(
        settings.cache_dir.clone(),
        Duration::from_secs(settings.cache_ttl_seconds),
    )
    .await?;

    match action {
        CacheAction::Status => {
            let stats = cache.stats().await?;
            println!(
                "Cache directory: {}\nTTL: {} seconds\nEntries: {} ({} expired)",
                cache.dir().display(),
                settings.cache_ttl_seconds,
                stats.entries,
                stats.expired
            );
        }
        CacheAction::ClearExpired => {
            println!("✓ Removed {} expired entries", cache.clear_expired().await?);
        }
        CacheAction::ClearAll => {
            println!("✓ Removed {} entries", cache.clear_all().await?);
        }
    }
    Ok(())
}

async fn init(settings: &Settings) -> Result<()> {
    for dir in [
        settings.vector_db_path.as_path(),
        settings.cache_dir.as_path(),
        Path::new("logs"),
    ] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Could not create {}", dir.display()))?;
        println!("✓ {}", dir.display());
    }

    let env = Path::new(".env");
    if tokio::fs::try_exists(env).await? {
        println!(".env already exists, leaving it alone");
    } else {
        tokio::fs::write(env, ENV_TEMPLATE)
            .await
            .context("Could not write .env")?;
        println!("✓ Created .env template; add your Gemini credentials");
    }
    Ok(())
}
