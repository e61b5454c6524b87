//! bookrag-retrieve
//!
//! Builds a corpus from a directory of textbooks and answers top-k similarity
//! queries against it.

pub mod answer;
pub mod builder;
pub mod ranking;
pub mod retriever;

pub use answer::Answer;
pub use builder::IndexBuilder;
pub use retriever::{Retriever, RetrieverState};
