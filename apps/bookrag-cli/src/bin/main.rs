use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookrag_core::config::{Config, RagConfig};
use bookrag_embed::default_encoder;
use bookrag_retrieve::Retriever;

#[derive(Parser)]
#[command(name = "bookrag", about = "Textbook passage retrieval", version)]
struct Cli {
    /// Resolve relative directories from config against this directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index from the textbooks directory, or load the existing one
    Index {
        /// Rebuild even if a persisted index exists
        #[arg(long)]
        force: bool,
    },
    /// Print the passages most similar to a query
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the retrieval context for a question
    Answer {
        question: String,
        #[arg(short)]
        k: Option<usize>,
    },
}

fn load_config(root: Option<&PathBuf>) -> anyhow::Result<RagConfig> {
    let rag = Config::load().and_then(|c| c.rag()).context("Error loading config")?;
    Ok(match root {
        Some(root) => rag.with_base(root),
        None => rag,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.root.as_ref())?;
    let encoder = default_encoder(&config).context("Failed to load encoder")?;
    let retriever: Retriever = Retriever::from_config(&config, encoder);

    match cli.command {
        Command::Index { force } => {
            let corpus = retriever.rebuild(force)?;
            info!(origin = ?corpus.origin(), "Index ready");
            println!("✅ Index ready ({} chunks)", corpus.len());
        }
        Command::Search { query, top_k, json } => {
            let results = retriever.search(&query, top_k.unwrap_or(config.top_k))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }
            println!("🔍 Found {} results for: \"{}\"", results.len(), query);
            for (i, result) in results.iter().enumerate() {
                println!(
                    "\n  {}. score={:.4}  source={}  start_char={}",
                    i + 1,
                    result.score,
                    result.metadata.source,
                    result.metadata.start_char
                );
                println!("     📝 {}", result.content);
            }
        }
        Command::Answer { question, k } => {
            let answer = retriever.answer(&question, k.unwrap_or(config.top_k))?;
            if answer.is_empty() {
                println!("No passages found.");
            } else {
                print!("{}", answer.context);
            }
        }
    }
    Ok(())
}
