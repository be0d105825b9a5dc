//! CLI entry-point for embedding reviews and building the vector index.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    cli::index_input,
    config::{EmbeddingBackend, Settings},
    data::reviews::ReviewTable,
    nlp::{self, embeddings},
};

/// Args for the `index` command.
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct Args {
    /// Dataset to index; defaults to the summary-augmented dataset.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Override the configured embedding backend. The default `hashing` backend is
    /// lexical only; use `fastembed` or `gemini` for semantic search.
    #[arg(long, value_enum)]
    pub backend: Option<EmbeddingBackend>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let input = index_input(&settings, args.input);
    let table = ReviewTable::load(&input).with_context(|| format!("loading {}", input.display()))?;

    let backend = args.backend.unwrap_or(settings.embedding_backend);
    let mut embedder = embeddings::embedder_for(backend, &settings)?;
    let paths = settings.index_paths();
    let manifest = nlp::build_index(embedder.as_mut(), &table, &paths)
        .await
        .context("building vector index")?;

    println!(
        "indexed {} reviews ({} dims, {} backend) -> {}",
        manifest.rows,
        manifest.dim,
        manifest.backend,
        paths.index.display()
    );
    Ok(())
}
