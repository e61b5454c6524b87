//! Exact brute-force index over squared Euclidean distance.
//!
//! Serialized as `[bincode payload][magic "BRF1"][CRC32 BE]`; a bad footer or
//! payload is reported as index corruption.

use serde::{Deserialize, Serialize};

use bookrag_core::traits::{VectorIndex, NO_MATCH};
use bookrag_core::{Error, Result};

const MAGIC: &[u8; 4] = b"BRF1";
const FOOTER_LEN: usize = 8;

/// Row-major store of `len() * dim` floats; row `i` is the vector with id `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        if id >= self.len() {
            return None;
        }
        Some(&self.data[id * self.dim..(id + 1) * self.dim])
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl VectorIndex for FlatL2Index {
    fn with_dim(dim: usize) -> Self {
        Self::new(dim)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }
        if self.dim == 0 {
            return Err(Error::Operation("cannot add vectors to a zero-dimensional index".into()));
        }
        // validate everything first so a bad batch leaves the index untouched
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != self.dim) {
            return Err(Error::Operation(format!(
                "vector {i} has dimension {} but the index expects {}",
                v.len(),
                self.dim
            )));
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)> {
        if query.len() != self.dim {
            return Err(Error::Operation(format!(
                "query has dimension {} but the index expects {}",
                query.len(),
                self.dim
            )));
        }
        let mut scored: Vec<(f32, usize)> = if self.is_empty() {
            Vec::new()
        } else {
            self.data.chunks_exact(self.dim).map(|row| squared_l2(query, row)).zip(0..).collect()
        };
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.truncate(k);

        let mut distances: Vec<f32> = Vec::new();
        let mut ids: Vec<i64> = Vec::new();
        distances
            .try_reserve_exact(k)
            .and_then(|()| ids.try_reserve_exact(k))
            .map_err(|e| Error::Operation(format!("cannot allocate {k} result slots: {e}")))?;
        for (d, id) in scored {
            distances.push(d);
            ids.push(i64::try_from(id).map_err(|_| Error::Operation(format!("id {id} out of range")))?);
        }
        distances.resize(k, f32::MAX);
        ids.resize(k, NO_MATCH);
        Ok((distances, ids))
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self).map_err(|e| Error::Operation(format!("index serialization failed: {e}")))?;
        let crc = crc32fast::hash(&payload);
        let mut out = Vec::with_capacity(payload.len() + FOOTER_LEN);
        out.extend_from_slice(&payload);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }

    fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FOOTER_LEN {
            return Err(Error::IndexCorruption(format!("index blob too short ({} bytes)", bytes.len())));
        }
        let (payload, footer) = bytes.split_at(bytes.len() - FOOTER_LEN);
        if &footer[..4] != MAGIC {
            return Err(Error::IndexCorruption("index blob has no checksum footer".into()));
        }
        let stored = u32::from_be_bytes([footer[4], footer[5], footer[6], footer[7]]);
        let computed = crc32fast::hash(payload);
        if stored != computed {
            return Err(Error::IndexCorruption(format!(
                "index checksum mismatch: expected {stored:#010x}, got {computed:#010x}"
            )));
        }
        let index: Self = bincode::deserialize(payload)
            .map_err(|e| Error::IndexCorruption(format!("index payload unreadable: {e}")))?;
        let misaligned = if index.dim == 0 { !index.data.is_empty() } else { index.data.len() % index.dim != 0 };
        if misaligned {
            return Err(Error::IndexCorruption(format!(
                "index holds {} floats, not a multiple of dimension {}",
                index.data.len(),
                index.dim
            )));
        }
        Ok(index)
    }
}
