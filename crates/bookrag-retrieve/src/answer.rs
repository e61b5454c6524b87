use std::fmt::Write;

use serde::Serialize;

use bookrag_core::types::{Passage, SearchResult};

/// Retrieval context for a question. `passages` and `scores` are parallel and
/// follow the rank order used in `context`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub context: String,
    pub passages: Vec<Passage>,
    pub scores: Vec<f32>,
}

impl Answer {
    pub fn from_results(results: Vec<SearchResult>) -> Self {
        let mut context = String::new();
        let mut passages = Vec::with_capacity(results.len());
        let mut scores = Vec::with_capacity(results.len());
        for (rank, result) in results.into_iter().enumerate() {
            // writing into a String cannot fail
            let _ = writeln!(context, "Passage {}:\n{}", rank + 1, result.content);
            passages.push(Passage { title: result.metadata.source, content: result.content });
            scores.push(result.score);
        }
        Self { context, passages, scores }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}
