//! Retrieval-augmented question answering over the review index.

use crate::{
    error::ServiceError,
    genai::{retry::RetryPolicy, GenerativeService},
    index::{persist::MetadataRecord, Neighbor},
    nlp::summarize::one_line,
};

pub const NO_ANSWER: &str = "No response generated.";

/// Analyst prompt grounding `question` in the retrieved reviews.
pub fn build_prompt(question: &str, hits: &[(Neighbor, MetadataRecord)]) -> String {
    let mut prompt = format!(
        "You are a market research analyst.\n\
         Use the following customer reviews (with topics and sentiment) to answer the question.\n\
         \n\
         Question: {}\n\
         \n\
         Reviews ({} most relevant):\n",
        question.trim(),
        hits.len()
    );
    for (neighbor, record) in hits {
        prompt.push_str(&format!(
            "- [row {}, topic {}, sentiment {}] {}\n",
            neighbor.position,
            record.topic,
            record.sentiment,
            one_line(&record.review_text)
        ));
    }
    prompt.push_str("\nPlease provide a concise, data-driven answer highlighting patterns and insights.\n");
    prompt
}

/// Ask the service; an empty reply renders as [`NO_ANSWER`].
pub async fn answer(
    service: &dyn GenerativeService,
    retry: &RetryPolicy,
    question: &str,
    hits: &[(Neighbor, MetadataRecord)],
) -> Result<String, ServiceError> {
    let prompt = build_prompt(question, hits);
    let reply = retry
        .run("generate_content", || service.generate_content(&prompt))
        .await?;
    Ok(reply
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_ANSWER.to_string()))
}
