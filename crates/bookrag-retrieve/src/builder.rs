//! Documents to chunks to vectors to a persisted corpus.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookrag_core::chunker::Chunker;
use bookrag_core::config::RagConfig;
use bookrag_core::documents::{read_documents, Documents};
use bookrag_core::traits::{Encoder, VectorIndex};
use bookrag_core::types::Chunk;
use bookrag_core::{Error, Result};
use bookrag_vector::{Corpus, CorpusOrigin, CorpusStore, FlatL2Index};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}";

pub struct IndexBuilder<I = FlatL2Index> {
    encoder: Arc<dyn Encoder>,
    store: CorpusStore,
    chunker: Chunker,
    batch_size: usize,
    textbooks_dir: PathBuf,
    show_progress: bool,
    _index: PhantomData<fn() -> I>,
}

impl<I: VectorIndex> IndexBuilder<I> {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        store: CorpusStore,
        chunker: Chunker,
        batch_size: usize,
        textbooks_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            encoder,
            store,
            chunker,
            batch_size: batch_size.max(1),
            textbooks_dir: textbooks_dir.into(),
            show_progress: true,
            _index: PhantomData,
        }
    }

    pub fn from_config(config: &RagConfig, encoder: Arc<dyn Encoder>) -> Self {
        Self::new(
            encoder,
            CorpusStore::from_config(config),
            Chunker::from_config(config),
            config.batch_size,
            config.textbooks_dir.clone(),
        )
    }

    /// Hide the embedding progress bar.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    pub fn textbooks_dir(&self) -> &Path {
        &self.textbooks_dir
    }

    /// Build a corpus from `documents`, or load the persisted one unless
    /// `force_rebuild` is set. A fresh build replaces whatever was persisted.
    pub fn build(&self, documents: &Documents, force_rebuild: bool) -> Result<Corpus<I>> {
        if let Some(corpus) = self.try_load(force_rebuild)? {
            return Ok(corpus);
        }
        self.build_fresh(documents)
    }

    /// Like [`IndexBuilder::build`], reading `*.txt` files from the textbooks
    /// directory. Nothing is read when a persisted corpus gets loaded.
    pub fn build_from_dir(&self, force_rebuild: bool) -> Result<Corpus<I>> {
        if let Some(corpus) = self.try_load(force_rebuild)? {
            return Ok(corpus);
        }
        info!("Reading textbooks from {}", self.textbooks_dir.display());
        let documents = read_documents(&self.textbooks_dir)?;
        self.build_fresh(&documents)
    }

    /// Chunk every document in ascending source id order.
    pub fn chunk_documents(&self, documents: &Documents) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|(source_id, text)| self.chunker.chunk(text, source_id))
            .collect()
    }

    fn try_load(&self, force_rebuild: bool) -> Result<Option<Corpus<I>>> {
        if force_rebuild || !self.store.exists() {
            return Ok(None);
        }
        info!("Loading existing index from {}", self.store.index_path().display());
        let corpus: Corpus<I> = self.store.load()?;
        let (index_dim, encoder_dim) = (corpus.index().dim(), self.encoder.dim());
        if index_dim != encoder_dim {
            return Err(Error::InvalidConfig(format!(
                "persisted index has dimension {index_dim} but encoder {} produces {encoder_dim}; rebuild with --force",
                self.encoder.model_id()
            )));
        }
        Ok(Some(corpus))
    }

    fn build_fresh(&self, documents: &Documents) -> Result<Corpus<I>> {
        let chunks = self.chunk_documents(documents);
        info!(documents = documents.len(), chunks = chunks.len(), "Chunked documents");

        let vectors = self.encode_chunks(&chunks)?;
        let mut index = I::with_dim(self.encoder.dim());
        index.add(&vectors)?;

        let corpus = Corpus::new(chunks, index, CorpusOrigin::Built)?;
        self.store.save(&corpus)?;
        info!(chunks = corpus.len(), model = self.encoder.model_id(), "Index built");
        Ok(corpus)
    }

    fn encode_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let dim = self.encoder.dim();
        let pb = if self.show_progress {
            ProgressBar::new(chunks.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Embedding with {}", self.encoder.model_id()));

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let encoded = self.encoder.encode(&texts)?;
            if encoded.len() != texts.len() {
                pb.abandon();
                return Err(Error::Encoding(format!(
                    "encoder returned {} vectors for {} chunks",
                    encoded.len(),
                    texts.len()
                )));
            }
            if let Some(bad) = encoded.iter().find(|v| v.len() != dim) {
                pb.abandon();
                return Err(Error::Encoding(format!(
                    "encoder returned a vector of dimension {} instead of {dim}",
                    bad.len()
                )));
            }
            vectors.extend(encoded);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("Embedding complete");
        Ok(vectors)
    }
}
