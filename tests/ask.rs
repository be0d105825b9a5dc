mod common;

use common::{write_reviews, StubService};
use review_insights::{
    config::Settings,
    data::reviews::ReviewTable,
    genai::retry::RetryPolicy,
    index::persist::IndexBundle,
    nlp::{self, ask, embeddings::HashingEmbedder},
};

const ROWS: &[(&str, &str, &str)] = &[
    ("battery drains overnight", "0", "negative"),
    ("delivery was late\nand the box crushed", "1", "negative"),
    ("great value for the price", "2", "positive"),
    ("battery lasts all week", "0", "positive"),
];

#[tokio::test]
async fn answer_is_grounded_in_retrieved_reviews() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_reviews(dir.path(), ROWS);
    let settings = Settings::with_data_dir(dir.path());
    let table = ReviewTable::load(&input).unwrap();
    let paths = settings.index_paths();
    let mut embedder = HashingEmbedder::new(64);
    nlp::build_index(&mut embedder, &table, &paths).await.unwrap();

    let (bundle, _) = IndexBundle::load(&paths).unwrap();
    let hits = nlp::search(&mut embedder, &bundle, "delivery was late and the box crushed", 2)
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0.position, 1);

    let service = StubService::default();
    let reply = ask::answer(&service, &RetryPolicy::none(), "Why are people unhappy?", &hits)
        .await
        .unwrap();
    assert!(!reply.is_empty());
    assert_ne!(reply, ask::NO_ANSWER);

    let prompts = service.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Question: Why are people unhappy?\n"));
    assert!(prompt.contains("Reviews (2 most relevant)"));
    assert!(prompt.contains(
        "- [row 1, topic 1, sentiment negative] delivery was late and the box crushed\n"
    ));
    let (second, record) = &hits[1];
    assert!(prompt.contains(&format!(
        "- [row {}, topic {}, sentiment {}]",
        second.position, record.topic, record.sentiment
    )));
}
