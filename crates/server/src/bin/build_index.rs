//! Offline knowledge index builder
//!
//! Reads every `.txt` file in the source directory, chunks and embeds it
//! with the configured provider, then writes the index the server loads at
//! startup. Nothing is written unless the whole build succeeds.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use voice_agent_config::load_settings;
use voice_agent_rag::{ChunkSplitter, KnowledgeLoader, OpenAiEmbedder, OpenAiEmbeddingConfig};
use voice_agent_server::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "build-index", version, about = "Build the museum knowledge index")]
struct Args {
    /// Directory of `.txt` documents [default: rag.source_dir]
    #[arg(long, env = "BUILD_INDEX_SOURCE")]
    source: Option<PathBuf>,

    /// Index output directory [default: rag.index_path]
    #[arg(long, env = "BUILD_INDEX_OUTPUT")]
    output: Option<PathBuf>,

    /// Chunk size in characters [default: rag.chunk_size]
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by adjacent chunks [default: rag.chunk_overlap]
    #[arg(long)]
    chunk_overlap: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env = std::env::var("VOICE_AGENT_ENV").ok();
    let config = load_settings(env.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.observability);

    let source = args
        .source
        .unwrap_or_else(|| PathBuf::from(&config.rag.source_dir));
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.rag.index_path));

    // Reject bad chunk parameters before touching the corpus
    let splitter = ChunkSplitter::new(
        args.chunk_size.unwrap_or(config.rag.chunk_size),
        args.chunk_overlap.unwrap_or(config.rag.chunk_overlap),
    )
    .context("Invalid chunk parameters")?;

    let embedder = OpenAiEmbedder::new(OpenAiEmbeddingConfig::from(&config.providers))
        .context("Failed to create embedding client")?;

    tracing::info!(
        source = %source.display(),
        chunk_size = splitter.chunk_size(),
        chunk_overlap = splitter.chunk_overlap(),
        model = %config.providers.embedding_model,
        "Building knowledge index"
    );

    let started = Instant::now();
    let (index, stats) = KnowledgeLoader::build_index(&source, &splitter, Arc::new(embedder))
        .await
        .with_context(|| format!("Failed to build index from {}", source.display()))?;

    index
        .save(&output)
        .with_context(|| format!("Failed to write index to {}", output.display()))?;

    tracing::info!(
        documents = stats.documents,
        chunks = stats.chunks,
        output = %output.display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Knowledge index written"
    );

    Ok(())
}
