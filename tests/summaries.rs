mod common;

use std::{collections::BTreeSet, sync::Arc};

use common::{write_reviews, StubService};
use review_insights::{
    config::Settings,
    data::{
        reviews::ReviewTable,
        store::{load_summaries, SummaryPaths},
    },
    error::PipelineError,
    nlp::{self, summarize::SUMMARY_FAILED},
};

fn setup(rows: &[(&str, &str, &str)]) -> (tempfile::TempDir, Settings, ReviewTable) {
    let dir = tempfile::tempdir().unwrap();
    let input = write_reviews(dir.path(), rows);
    let settings = Settings::with_data_dir(dir.path());
    let table = ReviewTable::load(&input).unwrap();
    (dir, settings, table)
}

const ROWS: &[(&str, &str, &str)] = &[
    ("Battery lasts two days", "A", "positive"),
    ("Screen scratches easily, sadly", "B", "negative"),
    ("Charger \"fast\" indeed", "A", "positive"),
];

#[tokio::test]
async fn one_summary_per_distinct_topic() {
    let (_dir, settings, table) = setup(ROWS);
    let paths = SummaryPaths::from_settings(&settings);
    let report = nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap();

    let summaries = load_summaries(&paths.json).unwrap();
    let keys: BTreeSet<&str> = summaries.keys().map(String::as_str).collect();
    assert_eq!(keys, BTreeSet::from(["A", "B"]));
    assert_eq!(summaries["A"], "Summary of topic A.");
    assert_eq!(report.summaries, summaries);
}

#[tokio::test]
async fn augmented_rows_join_on_topic() {
    let (_dir, settings, table) = setup(ROWS);
    let paths = SummaryPaths::from_settings(&settings);
    nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap();

    let summaries = load_summaries(&paths.json).unwrap();
    let augmented = ReviewTable::load(&paths.csv).unwrap();
    assert_eq!(augmented.len(), 3);
    assert_eq!(
        augmented.headers().iter().collect::<Vec<_>>(),
        vec!["review_id", "review_text", "rating", "topic", "sentiment", "topic_summary"]
    );
    let topics = augmented.column("topic").unwrap();
    let joined = augmented.column("topic_summary").unwrap();
    for (topic, summary) in topics.iter().zip(&joined) {
        assert_eq!(summaries[*topic], *summary);
    }
    assert_eq!(augmented.column("review_text").unwrap()[2], "Charger \"fast\" indeed");
}

#[tokio::test]
async fn failing_topic_gets_sentinel_and_run_completes() {
    let (_dir, settings, table) = setup(ROWS);
    let paths = SummaryPaths::from_settings(&settings);
    nlp::summarize_topics(&settings, Arc::new(StubService::failing(&["B"])), &table, &paths)
        .await
        .unwrap();

    let summaries = load_summaries(&paths.json).unwrap();
    assert_eq!(summaries["A"], "Summary of topic A.");
    assert_eq!(summaries["B"], SUMMARY_FAILED);
    assert!(paths.csv.exists());
}

#[tokio::test]
async fn rerun_is_byte_identical() {
    let (_dir, settings, table) = setup(ROWS);
    let paths = SummaryPaths::from_settings(&settings);

    nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap();
    let first_csv = std::fs::read(&paths.csv).unwrap();
    let first_json = std::fs::read(&paths.json).unwrap();

    nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&paths.csv).unwrap(), first_csv);
    assert_eq!(std::fs::read(&paths.json).unwrap(), first_json);
}

#[tokio::test]
async fn resummarising_augmented_output_does_not_duplicate_column() {
    let (_dir, settings, table) = setup(ROWS);
    let paths = SummaryPaths::from_settings(&settings);
    nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap();
    let first = std::fs::read(&paths.csv).unwrap();

    let augmented = ReviewTable::load(&paths.csv).unwrap();
    nlp::summarize_topics(&settings, Arc::new(StubService::default()), &augmented, &paths)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&paths.csv).unwrap(), first);
}

#[tokio::test]
async fn only_first_samples_reach_the_prompt() {
    let texts: Vec<String> = (0..60).map(|i| format!("review number {i:02}")).collect();
    let rows: Vec<(&str, &str, &str)> = texts.iter().map(|t| (t.as_str(), "A", "neutral")).collect();
    let (_dir, mut settings, table) = setup(&rows);
    settings.summary_max_samples = 10;
    let service = Arc::new(StubService::default());
    let paths = SummaryPaths::from_settings(&settings);
    nlp::summarize_topics(&settings, service.clone(), &table, &paths)
        .await
        .unwrap();

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let listed: Vec<&str> = prompts[0]
        .lines()
        .filter(|line| line.contains("review number"))
        .collect();
    let expected: Vec<String> = (0..10)
        .map(|i| format!("{}. review number {i:02}", i + 1))
        .collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn missing_topic_column_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("reviews_with_sentiment.csv");
    std::fs::write(&input, "review_text,sentiment\nfine,positive\n").unwrap();
    let settings = Settings::with_data_dir(dir.path());
    let table = ReviewTable::load(&input).unwrap();
    let paths = SummaryPaths::from_settings(&settings);

    let err = nlp::summarize_topics(&settings, Arc::new(StubService::default()), &table, &paths)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingColumn { .. }));
    assert!(!paths.json.exists());
    assert!(!paths.csv.exists());
}
