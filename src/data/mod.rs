//! Dataset loading, topic grouping and summary persistence.

pub mod reviews;
pub mod store;
pub mod topics;
