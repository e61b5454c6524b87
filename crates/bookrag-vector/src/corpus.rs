use bookrag_core::traits::VectorIndex;
use bookrag_core::types::Chunk;
use bookrag_core::{Error, Result};

use crate::flat::FlatL2Index;

/// How a ready corpus came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusOrigin {
    Loaded,
    Built,
}

/// Ordered chunks and the index holding one vector per chunk.
///
/// Chunk `i` and vector id `i` describe the same text. The constructor refuses
/// any pair whose lengths disagree, so a `Corpus` is aligned by construction.
/// Read-only once built.
#[derive(Debug)]
pub struct Corpus<I = FlatL2Index> {
    chunks: Vec<Chunk>,
    index: I,
    origin: CorpusOrigin,
}

impl<I: VectorIndex> Corpus<I> {
    pub fn new(chunks: Vec<Chunk>, index: I, origin: CorpusOrigin) -> Result<Self> {
        if chunks.len() != index.len() {
            return Err(Error::IndexCorruption(format!(
                "{} chunks but {} indexed vectors",
                chunks.len(),
                index.len()
            )));
        }
        Ok(Self { chunks, index, origin })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk for a vector id returned by the index. `None` for negative or
    /// out-of-range ids.
    pub fn get(&self, id: i64) -> Option<&Chunk> {
        usize::try_from(id).ok().and_then(|i| self.chunks.get(i))
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn origin(&self) -> CorpusOrigin {
        self.origin
    }
}
