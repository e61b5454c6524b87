//! Domain types shared by the chunker, the corpus store and the retriever.

use serde::{Deserialize, Serialize};

/// Provenance of a chunk.
///
/// `start_char` is an approximate offset derived from the chunk buffer length,
/// not an exact index into the source document. Treat it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub start_char: usize,
}

/// A bounded span of source text plus its provenance, the unit of retrieval.
///
/// Inside a corpus a chunk's identity is its position, which is also the id
/// of its vector in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// One ranked hit. `score` is in `(0, 1]`, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// A retrieved passage as handed to answer composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub content: String,
}
