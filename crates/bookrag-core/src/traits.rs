use crate::error::Result;

/// Maps text to fixed-dimensional vectors.
///
/// `encode` returns one vector per input, in input order, each of length
/// `dim()`. An empty batch is an error; an empty string inside a batch is not.
pub trait Encoder: Send + Sync {
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Id reported by [`VectorIndex::search`] for a slot with no match.
pub const NO_MATCH: i64 = -1;

/// Nearest-neighbour storage. Ids are 0-based positions in append order.
pub trait VectorIndex: Send + Sync {
    fn with_dim(dim: usize) -> Self
    where
        Self: Sized;
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;
    /// Returns `k` `(distance, id)` slots in ascending distance. Slots past the
    /// end of the index carry [`NO_MATCH`]. Lower distance is more similar.
    /// A `k` too large to allocate is an error.
    fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)>;
    fn serialize(&self) -> Result<Vec<u8>>;
    fn deserialize(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}
