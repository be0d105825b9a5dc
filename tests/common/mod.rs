#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use review_insights::{error::ServiceError, genai::GenerativeService};

/// Write a labelled review CSV with a `rating` column carried along.
pub fn write_reviews(dir: &Path, rows: &[(&str, &str, &str)]) -> PathBuf {
    let path = dir.join("reviews_with_sentiment.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer
        .write_record(["review_id", "review_text", "rating", "topic", "sentiment"])
        .unwrap();
    for (idx, &(text, topic, sentiment)) in rows.iter().enumerate() {
        let id = (idx + 1).to_string();
        writer
            .write_record([id.as_str(), text, "4", topic, sentiment])
            .unwrap();
    }
    writer.flush().unwrap();
    path
}

/// Deterministic service: echoes the topic line, fails for chosen topics.
#[derive(Default)]
pub struct StubService {
    pub failing_topics: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubService {
    pub fn failing(topics: &[&str]) -> Self {
        Self {
            failing_topics: topics.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl GenerativeService for StubService {
    async fn generate_content(&self, prompt: &str) -> Result<Option<String>, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let topic_line = prompt
            .lines()
            .find(|line| line.starts_with("Summarize customer feedback for Topic "))
            .unwrap_or_default();
        let topic = topic_line
            .trim_start_matches("Summarize customer feedback for Topic ")
            .trim_end_matches('.');
        if self.failing_topics.iter().any(|t| t == topic) {
            return Err(ServiceError::Permanent(format!("rejected topic {topic}")));
        }
        Ok(Some(format!("  Summary of topic {topic}.  ")))
    }
}
