//! Grouping reviews by their upstream topic label.

use indexmap::IndexMap;

use crate::{
    data::reviews::{ReviewTable, TEXT_COLUMN, TOPIC_COLUMN},
    error::Result,
};

/// Reviews sharing one topic label, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicGroup {
    pub topic_id: String,
    pub reviews: Vec<String>,
}

/// Group review texts by topic.
///
/// Groups appear in order of each topic's first row; texts keep row order.
/// The label is an opaque key, so an empty cell forms its own group.
pub fn group_by_topic(table: &ReviewTable) -> Result<Vec<TopicGroup>> {
    let topics = table.column(TOPIC_COLUMN)?;
    let texts = table.column(TEXT_COLUMN)?;

    let mut grouped: IndexMap<&str, Vec<String>> = IndexMap::new();
    for (topic, text) in topics.into_iter().zip(texts) {
        grouped.entry(topic).or_default().push(text.to_string());
    }

    Ok(grouped
        .into_iter()
        .map(|(topic_id, reviews)| TopicGroup {
            topic_id: topic_id.to_string(),
            reviews,
        })
        .collect())
}
