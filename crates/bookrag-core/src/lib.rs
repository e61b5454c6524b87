//! bookrag-core
//!
//! Configuration, errors, domain types and the `Encoder`/`VectorIndex` seams
//! shared by the embedding, storage and retrieval crates, plus the chunker.

pub mod chunker;
pub mod config;
pub mod documents;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
