//! Command-line interface wiring for review-insights.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{
    config::{Settings, INPUT_FILE, SUMMARY_CSV_FILE},
    error::PipelineError,
    genai::{gemini::GeminiClient, GenerativeService},
};

pub mod ask;
pub mod index;
pub mod run;
pub mod search;
pub mod summarize;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Topic summaries and semantic search for customer reviews", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Summarize(args) => summarize::run(args, settings).await,
            Commands::Index(args) => index::run(args, settings).await,
            Commands::Search(args) => search::run(args, settings).await,
            Commands::Ask(args) => ask::run(args, settings).await,
            Commands::Run(args) => run::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarise reviews per topic and write the augmented dataset.
    Summarize(summarize::Args),
    /// Embed reviews and build the vector index bundle.
    Index(index::Args),
    /// Find the reviews nearest to a query.
    Search(search::Args),
    /// Answer a question from the most relevant reviews.
    Ask(ask::Args),
    /// Summarise, then index the augmented dataset.
    Run(run::Args),
}

/// The summary pipeline's default input.
pub(crate) fn summary_input(settings: &Settings, input: Option<PathBuf>) -> PathBuf {
    input.unwrap_or_else(|| settings.join_data(INPUT_FILE))
}

/// The indexing pipeline's default input: the augmented dataset.
pub(crate) fn index_input(settings: &Settings, input: Option<PathBuf>) -> PathBuf {
    input.unwrap_or_else(|| settings.join_data(SUMMARY_CSV_FILE))
}

/// The configured generative service; fails when no API key is set.
pub(crate) fn generative_service(settings: &Settings) -> Result<Arc<dyn GenerativeService>> {
    let client = GeminiClient::from_settings(settings)?.ok_or(PipelineError::MissingApiKey)?;
    Ok(Arc::new(client))
}
