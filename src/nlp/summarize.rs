//! Per-topic summary generation against a generative service.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::{
    data::{store::TopicSummaries, topics::TopicGroup},
    genai::{retry::RetryPolicy, GenerativeService},
};

/// Recorded when the service answers without text.
pub const NO_SUMMARY: &str = "No Summary Generated.";
/// Recorded when the call fails after retries.
pub const SUMMARY_FAILED: &str = "Error generating summary.";

pub const DEFAULT_MAX_SAMPLES: usize = 50;

/// How a topic's summary came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated,
    Empty,
    Failed,
}

/// Summaries for every topic plus how each was obtained.
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    pub summaries: TopicSummaries,
    pub outcomes: Vec<(String, SummaryOutcome)>,
}

impl SummaryReport {
    pub fn count(&self, outcome: SummaryOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Turns topic groups into summaries, one service call per topic.
pub struct SummaryGenerator {
    service: Arc<dyn GenerativeService>,
    retry: RetryPolicy,
    max_samples: usize,
    concurrency: usize,
}

impl SummaryGenerator {
    pub fn new(service: Arc<dyn GenerativeService>, retry: RetryPolicy) -> Self {
        Self {
            service,
            retry,
            max_samples: DEFAULT_MAX_SAMPLES,
            concurrency: 1,
        }
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Topics summarised at once; output order never depends on it.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Summarise one topic. Never fails: errors become a sentinel.
    pub async fn generate(&self, topic_id: &str, reviews: &[String]) -> (String, SummaryOutcome) {
        let prompt = build_prompt(topic_id, sample(reviews, self.max_samples));
        let result = self
            .retry
            .run("generate_content", || self.service.generate_content(&prompt))
            .await;
        match result {
            Ok(Some(text)) if !text.trim().is_empty() => {
                (text.trim().to_string(), SummaryOutcome::Generated)
            }
            Ok(_) => {
                warn!(topic = topic_id, "service returned no summary text");
                (NO_SUMMARY.to_string(), SummaryOutcome::Empty)
            }
            Err(err) => {
                warn!(topic = topic_id, %err, "failed to summarize topic");
                (SUMMARY_FAILED.to_string(), SummaryOutcome::Failed)
            }
        }
    }

    /// Summarise every group, keeping the groups' order in the result.
    pub async fn generate_all(&self, groups: &[TopicGroup]) -> SummaryReport {
        let results: Vec<(String, String, SummaryOutcome)> = stream::iter(groups)
            .map(|group| async move {
                info!(
                    topic = %group.topic_id,
                    reviews = group.reviews.len(),
                    "generating summary"
                );
                let (summary, outcome) = self.generate(&group.topic_id, &group.reviews).await;
                (group.topic_id.clone(), summary, outcome)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = SummaryReport::default();
        for (topic, summary, outcome) in results {
            report.summaries.insert(topic.clone(), summary);
            report.outcomes.push((topic, outcome));
        }
        info!(
            topics = report.summaries.len(),
            generated = report.count(SummaryOutcome::Generated),
            empty = report.count(SummaryOutcome::Empty),
            failed = report.count(SummaryOutcome::Failed),
            "summary batch complete"
        );
        report
    }
}

/// The first `max_samples` reviews, in their existing order.
pub fn sample(reviews: &[String], max_samples: usize) -> &[String] {
    &reviews[..reviews.len().min(max_samples)]
}

/// Market-research prompt for one topic's sampled reviews.
pub fn build_prompt(topic_id: &str, reviews: &[String]) -> String {
    let mut prompt = format!(
        "You are a market research assistant.\n\
         Summarize customer feedback for Topic {topic_id}.\n\
         Highlight:\n\
         - Main themes\n\
         - Positive aspects\n\
         - Negative aspects\n\
         - Suggestions for improvement\n\
         \n\
         Here are {} sample reviews:\n",
        reviews.len()
    );
    for (idx, review) in reviews.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", idx + 1, one_line(review)));
    }
    prompt
}

/// Line breaks become spaces so each review stays on its own prompt line.
/// Other whitespace is left as written.
pub(crate) fn one_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
