//! CLI entry-point for question answering over retrieved reviews.

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::instrument;

use crate::{
    cli::{generative_service, search::retrieve},
    config::Settings,
    nlp::ask,
};

/// Args for the `ask` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Question about the customer feedback.
    #[arg(long)]
    pub question: String,
    /// Reviews retrieved as context.
    #[arg(long, default_value_t = 20)]
    pub k: usize,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let service = generative_service(&settings)?;
    let hits = retrieve(&settings, &args.question, args.k).await?;
    let answer = ask::answer(service.as_ref(), &settings.retry, &args.question, &hits)
        .await
        .context("asking the generative service")?;
    println!("{answer}");
    Ok(())
}
