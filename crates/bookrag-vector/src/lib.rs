//! bookrag-vector
//!
//! The flat L2 vector index, the aligned in-memory corpus, and the store that
//! persists both.

pub mod corpus;
pub mod flat;
pub mod store;

pub use corpus::{Corpus, CorpusOrigin};
pub use flat::FlatL2Index;
pub use store::CorpusStore;
