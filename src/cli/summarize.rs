//! CLI entry-point for per-topic summary generation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    cli::{generative_service, summary_input},
    config::Settings,
    data::{reviews::ReviewTable, store::SummaryPaths},
    nlp::{self, summarize::SummaryOutcome},
};

/// Args for the `summarize` command.
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct Args {
    /// Dataset with topic and sentiment labels.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Override reviews sampled per topic.
    #[arg(long)]
    pub max_samples: Option<usize>,
    /// Override topics summarised concurrently.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, mut settings: Settings) -> Result<()> {
    if let Some(max_samples) = args.max_samples {
        settings.summary_max_samples = max_samples;
    }
    if let Some(concurrency) = args.concurrency {
        settings.summary_concurrency = concurrency.max(1);
    }
    let input = summary_input(&settings, args.input);
    let table = ReviewTable::load(&input).with_context(|| format!("loading {}", input.display()))?;

    let service = generative_service(&settings)?;
    let paths = SummaryPaths::from_settings(&settings);
    let report = nlp::summarize_topics(&settings, service, &table, &paths)
        .await
        .context("summarizing topics")?;

    let failed = report.count(SummaryOutcome::Failed);
    if failed > 0 {
        info!(failed, "some topics fell back to the failure sentinel");
    }
    println!(
        "{} topic summaries -> {}\naugmented dataset -> {}",
        report.summaries.len(),
        paths.json.display(),
        paths.csv.display()
    );
    Ok(())
}
