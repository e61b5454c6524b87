//! Query side: lazily obtains a corpus, then ranks chunks against a query.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use bookrag_core::config::RagConfig;
use bookrag_core::traits::{Encoder, VectorIndex};
use bookrag_core::types::SearchResult;
use bookrag_core::{Error, Result};
use bookrag_vector::{Corpus, CorpusOrigin, FlatL2Index};

use crate::answer::Answer;
use crate::builder::IndexBuilder;
use crate::ranking::similarity_from_distance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieverState {
    Uninitialized,
    Ready(CorpusOrigin),
}

/// Thread-safe retriever over one corpus.
///
/// The first query loads the persisted corpus or builds a new one; concurrent
/// first queries share a single build. A rebuild swaps the new corpus in only
/// after it is complete, and queries already running keep the old one.
pub struct Retriever<I = FlatL2Index> {
    builder: IndexBuilder<I>,
    corpus: RwLock<Option<Arc<Corpus<I>>>>,
    build_lock: Mutex<()>,
}

impl<I: VectorIndex> Retriever<I> {
    pub fn new(builder: IndexBuilder<I>) -> Self {
        Self { builder, corpus: RwLock::new(None), build_lock: Mutex::new(()) }
    }

    pub fn from_config(config: &RagConfig, encoder: Arc<dyn Encoder>) -> Self {
        Self::new(IndexBuilder::from_config(config, encoder))
    }

    pub fn builder(&self) -> &IndexBuilder<I> {
        &self.builder
    }

    pub fn state(&self) -> RetrieverState {
        match self.corpus.read().as_ref() {
            Some(corpus) => RetrieverState::Ready(corpus.origin()),
            None => RetrieverState::Uninitialized,
        }
    }

    /// The current corpus, loading or building it on first use.
    pub fn corpus(&self) -> Result<Arc<Corpus<I>>> {
        if let Some(corpus) = self.corpus.read().clone() {
            return Ok(corpus);
        }
        let _guard = self.build_lock.lock();
        // another caller may have finished while we waited
        if let Some(corpus) = self.corpus.read().clone() {
            return Ok(corpus);
        }
        let corpus = Arc::new(self.builder.build_from_dir(false)?);
        *self.corpus.write() = Some(Arc::clone(&corpus));
        Ok(corpus)
    }

    /// Build (or with `force_rebuild == false`, reload) and publish a new
    /// corpus. On failure the current corpus stays in place.
    pub fn rebuild(&self, force_rebuild: bool) -> Result<Arc<Corpus<I>>> {
        let _guard = self.build_lock.lock();
        let corpus = Arc::new(self.builder.build_from_dir(force_rebuild)?);
        *self.corpus.write() = Some(Arc::clone(&corpus));
        info!(chunks = corpus.len(), "Published corpus");
        Ok(corpus)
    }

    /// Up to `top_k` chunks most similar to `query`, best first.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let corpus = self.corpus()?;
        if corpus.is_empty() {
            debug!("search on empty corpus");
            return Ok(Vec::new());
        }
        let k = top_k.min(corpus.len());

        let query_vector = self
            .builder
            .encoder()
            .encode(&[query.to_string()])?
            .pop()
            .ok_or_else(|| Error::Encoding("encoder returned no vector for the query".into()))?;
        let (distances, ids) = corpus.index().search(&query_vector, k)?;

        let mut results: Vec<SearchResult> = distances
            .into_iter()
            .zip(ids)
            .filter_map(|(distance, id)| {
                let chunk = corpus.get(id)?;
                Some(SearchResult {
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    score: similarity_from_distance(distance),
                })
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!(k, hits = results.len(), "search complete");
        Ok(results)
    }

    /// Retrieve `k` passages for `question` and lay them out as context.
    pub fn answer(&self, question: &str, k: usize) -> Result<Answer> {
        Ok(Answer::from_results(self.search(question, k)?))
    }
}
