//! Natural language processing orchestration layer.

pub mod ask;
pub mod embeddings;
pub mod summarize;

use std::sync::Arc;

use tracing::info;

use crate::{
    config::Settings,
    data::{
        reviews::ReviewTable,
        store::{self, SummaryPaths},
        topics,
    },
    error::Result,
    genai::GenerativeService,
    index::{
        persist::{BundlePaths, IndexBundle, IndexManifest, MetadataRecord},
        FlatL2Index, Neighbor,
    },
    nlp::{
        embeddings::Embedder,
        summarize::{SummaryGenerator, SummaryReport},
    },
};

/// Group reviews by topic, summarise each topic and persist both outputs.
pub async fn summarize_topics(
    settings: &Settings,
    service: Arc<dyn GenerativeService>,
    table: &ReviewTable,
    paths: &SummaryPaths,
) -> Result<SummaryReport> {
    let groups = topics::group_by_topic(table)?;
    info!(reviews = table.len(), topics = groups.len(), "grouped reviews by topic");

    let generator = SummaryGenerator::new(service, settings.retry)
        .with_max_samples(settings.summary_max_samples)
        .with_concurrency(settings.summary_concurrency);
    let report = generator.generate_all(&groups).await;

    store::persist(&report.summaries, table, paths)?;
    Ok(report)
}

/// Embed every review, build the L2 index and persist the aligned bundle.
pub async fn build_index(
    embedder: &mut dyn Embedder,
    table: &ReviewTable,
    paths: &BundlePaths,
) -> Result<IndexManifest> {
    let metadata: Vec<MetadataRecord> = table
        .reviews()?
        .into_iter()
        .map(|review| MetadataRecord {
            review_text: review.text.to_string(),
            topic: review.topic.to_string(),
            sentiment: review.sentiment.to_string(),
        })
        .collect();
    let texts = embeddings::review_texts(table)?;

    let vectors = embeddings::embed(embedder, &texts).await?;
    let index = FlatL2Index::build(&vectors)?;
    let bundle = IndexBundle::new(embedder.name(), index, metadata)?;
    Ok(bundle.save(paths)?)
}

/// Embed `query` and return the `k` nearest reviews with their metadata.
pub async fn search(
    embedder: &mut dyn Embedder,
    bundle: &IndexBundle,
    query: &str,
    k: usize,
) -> Result<Vec<(Neighbor, MetadataRecord)>> {
    let mut vectors = embeddings::embed(embedder, &[query.to_string()]).await?;
    let query_vector = vectors.pop().unwrap_or_default();
    let hits = bundle.search(&query_vector, k)?;
    Ok(hits
        .into_iter()
        .map(|hit| (hit.neighbor, hit.record.clone()))
        .collect())
}
