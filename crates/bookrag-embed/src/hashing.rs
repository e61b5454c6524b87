use std::hash::{Hash, Hasher};

use twox_hash::XxHash64;

use bookrag_core::traits::Encoder;
use bookrag_core::{Error, Result};

/// Deterministic bag-of-words encoder for tests and offline development.
///
/// Each whitespace token is hashed into a bucket; vectors are L2-normalised.
/// Identical texts always map to identical vectors.
pub struct HashingEncoder {
    dim: usize,
    id: String,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hashing:d{dim}") }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Encoder for HashingEncoder {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Err(Error::Encoding("cannot encode an empty batch".into()));
        }
        Ok(batch.iter().map(|t| self.embed_text(t)).collect())
    }
}
