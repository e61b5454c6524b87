//! bookrag-embed
//!
//! `Encoder` implementations: a local sentence-transformers model run with
//! candle, and a hashing encoder for tests. Set `APP_USE_FAKE_EMBEDDINGS=1` to
//! get the hashing encoder from [`default_encoder`].

use std::sync::Arc;

use tracing::info;

use bookrag_core::config::RagConfig;
use bookrag_core::traits::Encoder;
use bookrag_core::Result;

pub mod device;
pub mod hashing;
pub mod minilm;
pub mod pool;
pub mod tokenize;

pub use hashing::HashingEncoder;
pub use minilm::MiniLmEncoder;
pub use pool::masked_mean_l2;

/// Output size of all-MiniLM-L6-v2; the hashing encoder mirrors it.
pub const MINILM_DIM: usize = 384;

pub fn default_encoder(config: &RagConfig) -> Result<Arc<dyn Encoder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake {
        info!("Using HashingEncoder");
        return Ok(Arc::new(HashingEncoder::new(MINILM_DIM)));
    }
    Ok(Arc::new(MiniLmEncoder::load(config)?))
}
