//! Snout CLI
//!
//! `snout sync` re-indexes Bear notes that need it and advances the sync
//! checkpoint; `snout query` runs the hybrid retrieval pipeline and prints
//! ranked chunk results.

mod progress;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use snout_core::{
    FastembedEmbedder, FastembedReranker, IndexStore, ModelCache, QueryHit, SnoutConfig, pipeline,
    source, sync,
};

use progress::ProgressPrinter;

/// Snout - hybrid local search over Bear notes
#[derive(Parser)]
#[command(name = "snout")]
#[command(version = snout_core::VERSION)]
#[command(about = "Hybrid local search over Bear notes")]
#[command(
    long_about = "Snout keeps a local index over your Bear notes and answers queries by \
                  fusing BM25 keyword search with semantic embedding search, then reranking \
                  with a cross-encoder. Everything runs locally."
)]
struct Cli {
    /// Path to the config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose pipeline logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync Bear notes into the local index
    Sync,

    /// Query the local index
    Query {
        /// Query text
        query: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Md)]
        output: OutputFormat,

        /// Override the configured result count
        #[arg(long = "top-n")]
        top_n: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Markdown list
    Md,
    /// Tab-separated plain text
    Text,
    /// JSON object
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync => run_sync(&config),
        Commands::Query {
            query,
            output,
            top_n,
        } => run_query(&config, &query, output, top_n),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("snout_core=debug,snout=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<SnoutConfig> {
    let config = match path {
        Some(path) => SnoutConfig::load(path),
        None => SnoutConfig::load_default(),
    };
    config.context("configuration error")
}

fn run_sync(config: &SnoutConfig) -> Result<()> {
    let notes = source::bear::read_notes(&config.bear_db_path, None)
        .context("reading the Bear note source")?;
    tracing::debug!(count = notes.len(), "source notes read");

    let mut store = IndexStore::open(&config.db_path).context("opening the index database")?;

    let cache = ModelCache::new();
    let embedder = FastembedEmbedder::load(&cache, &config.models_dir)
        .context("loading the embedding model")?;

    let mut printer = ProgressPrinter::stdout("sync");
    let report = sync::run_sync(
        &mut store,
        notes,
        &embedder,
        &config.sync_options(),
        &mut |p| printer.update(p),
    )
    .context("sync failed")?;
    printer.finish(&report);

    if report.failed > 0 {
        eprintln!(
            "{} {} note(s) failed and will be retried on the next sync",
            "warning:".yellow().bold(),
            report.failed
        );
    }
    Ok(())
}

fn run_query(
    config: &SnoutConfig,
    query: &str,
    output: OutputFormat,
    top_n: Option<i64>,
) -> Result<()> {
    let store = IndexStore::open(&config.db_path).context("opening the index database")?;

    let cache = ModelCache::new();
    let embedder = FastembedEmbedder::load(&cache, &config.models_dir)
        .context("loading the embedding model")?;
    let reranker = FastembedReranker::load(&cache, &config.models_dir)
        .context("loading the reranker model")?;

    let hits = pipeline::run_query(
        &store,
        &embedder,
        &reranker,
        query,
        &config.query_options(top_n),
    )
    .context("query failed")?;

    print_hits(query, &hits, output)
}

fn print_hits(query: &str, hits: &[QueryHit], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "query": query,
                "results": hits
                    .iter()
                    .map(|hit| {
                        serde_json::json!({
                            "id": hit.id(),
                            "noteId": hit.chunk.note_id,
                            "chunkIndex": hit.chunk.chunk_index,
                            "title": hit.title,
                            "score": hit.score,
                        })
                    })
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Text => {
            for hit in hits {
                println!("{:.4}\t{}\t{}", hit.score, hit.title, hit.id());
            }
        }
        OutputFormat::Md => {
            for hit in hits {
                println!("- {} ({:.4}) - {}", hit.title, hit.score, hit.id());
            }
        }
    }
    Ok(())
}
