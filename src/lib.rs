//! Topic summarisation and semantic indexing for customer review datasets.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod genai;
pub mod index;
pub mod logging;
pub mod nlp;
