//! CLI entry-point chaining summarisation and indexing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    cli::{index, summarize},
    config::{EmbeddingBackend, Settings},
};

/// Args for the `run` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Dataset with topic and sentiment labels.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Override the configured embedding backend.
    #[arg(long, value_enum)]
    pub backend: Option<EmbeddingBackend>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    summarize::run(
        summarize::Args {
            input: args.input,
            ..Default::default()
        },
        settings.clone(),
    )
    .await?;
    info!("summaries written; indexing augmented dataset");
    index::run(
        index::Args {
            input: None,
            backend: args.backend,
        },
        settings,
    )
    .await
}
