//! CLI entry-point for nearest-neighbour review search.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::{EmbeddingBackend, Settings},
    index::{
        persist::{IndexBundle, MetadataRecord},
        Neighbor,
    },
    nlp::{self, embeddings},
};

/// Args for the `search` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Free-text query.
    #[arg(long)]
    pub query: String,
    /// Number of reviews to return.
    #[arg(long, default_value_t = 5)]
    pub k: usize,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let hits = retrieve(&settings, &args.query, args.k).await?;
    for (neighbor, record) in hits {
        println!(
            "#{:<6} d={:.4}  topic={}  sentiment={}\n    {}",
            neighbor.position,
            neighbor.distance,
            record.topic,
            record.sentiment,
            record.review_text
        );
    }
    Ok(())
}

/// Reload the index bundle and look up `query` with the backend that built it.
pub(crate) async fn retrieve(
    settings: &Settings,
    query: &str,
    k: usize,
) -> Result<Vec<(Neighbor, MetadataRecord)>> {
    let paths = settings.index_paths();
    let (bundle, manifest) = IndexBundle::load(&paths)
        .with_context(|| format!("loading index bundle {}", paths.manifest.display()))?;
    info!(rows = bundle.len(), backend = %manifest.backend, "loaded index bundle");

    let backend: EmbeddingBackend = manifest.backend.parse()?;
    let query_settings = Settings {
        embedding_dim: manifest.dim,
        ..settings.clone()
    };
    let mut embedder = embeddings::embedder_for(backend, &query_settings)?;
    let hits = nlp::search(embedder.as_mut(), &bundle, query, k).await?;
    Ok(hits)
}
