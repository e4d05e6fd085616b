//! codechat-indexer - background indexing core for a local code-chat daemon.
//!
//! This binary is the composition root: it loads configuration, wires a
//! concrete `EmbeddingClient` (HTTP-backed, or the deterministic mock when
//! no API key is configured) behind the `Indexer`, and drives one-shot
//! builds, a filesystem watch loop, or an ad-hoc query. The HTTP surface and
//! conversational routing that would sit in front of this live in a
//! separate, out-of-scope layer; this binary only exercises the seams that
//! layer would call through.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use codechat_indexer::{Config, EmbeddingClient, HttpEmbeddingClient, Indexer, MockEmbeddingClient, NotifyWatcher};

#[derive(Parser)]
#[command(name = "codechat-indexer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the JSON configuration document (§10.3).
    #[arg(long, global = true, default_value = "~/.codechat/config.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform a full index rebuild of a project directory.
    Build {
        /// Path to the project root to index.
        path: PathBuf,
    },

    /// Watch a project directory and incrementally reconcile changes.
    Watch {
        /// Path to the project root to watch.
        path: PathBuf,
    },

    /// Run a single semantic query against an already-built index.
    Query {
        /// Path to the project root whose index should be queried.
        path: PathBuf,

        /// The query text.
        text: String,

        /// Maximum number of results.
        #[arg(short, long, default_value = "10")]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let config = Config::load(expand_tilde(&cli.config));

    match cli.command {
        Commands::Build { path } => {
            let indexer = build_indexer(&path, &config)?;
            info!(path = %path.display(), "running full index rebuild");
            indexer.build_index().await?;
            println!("Index build complete for {}.", path.display());
        }

        Commands::Watch { path } => {
            let indexer = build_indexer(&path, &config)?;
            info!(path = %path.display(), "running initial build before watching");
            indexer.build_index().await?;

            let mut watcher = NotifyWatcher::watch(&path)?;
            println!("Watching {} for changes. Press Ctrl+C to stop.", path.display());
            while let Some(event) = watcher.recv().await {
                if let Err(e) = indexer.process_event(event).await {
                    tracing::warn!(error = %e, "watch: failed to process filesystem event");
                }
            }
        }

        Commands::Query { path, text, k } => {
            let indexer = build_indexer(&path, &config)?;
            let results = indexer.query(&text, k).await?;

            if results.is_empty() {
                println!("No results found.");
            } else {
                println!("Found {} results:\n", results.len());
                for (i, (id, distance)) in results.iter().enumerate() {
                    println!("{}. {} (distance: {:.4})", i + 1, id, distance);
                }
            }
        }
    }

    Ok(())
}

fn build_indexer(path: &PathBuf, config: &Config) -> Result<Indexer> {
    let cache_dir = config.cache_dir_path();
    let dimension = config.dimension;

    let embedding_client: Arc<dyn EmbeddingClient> = if config.embedding_api_key.is_empty() {
        info!("no embedding API key configured, using deterministic mock embedding client");
        Arc::new(MockEmbeddingClient::new(dimension))
    } else {
        Arc::new(HttpEmbeddingClient::new(
            config.embedding_api_key.clone(),
            "nomic-embed-text",
            "http://localhost:11434",
            dimension,
        ))
    };

    Indexer::new(path.clone(), cache_dir, dimension, embedding_client)
        .context("failed to construct indexer")
}

/// Expand a leading `~` in a CLI-provided path before handing it to
/// [`Config::load`], mirroring the corpus's hand-rolled expansion rather than
/// pulling in a dedicated crate for a single substitution.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{}", home.to_string_lossy(), rest);
        }
    }
    path.to_string()
}
