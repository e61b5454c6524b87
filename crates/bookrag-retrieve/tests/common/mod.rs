#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use bookrag_core::config::RagConfig;
use bookrag_core::traits::Encoder;
use bookrag_core::{Error, Result};
use bookrag_embed::HashingEncoder;
use bookrag_retrieve::{IndexBuilder, Retriever};

pub const DIM: usize = 64;

pub const ANATOMY: &str = "The femur is the longest bone in the human body. \
The skull protects the brain from injury. Ligaments connect bone to bone.";

pub const CELLS: &str = "Cells are the basic unit of life.\n\nMitochondria produce energy for the cell. \
Ribosomes build proteins from amino acids! Is the nucleus the control centre? It stores DNA.";

pub fn write_textbooks(root: &Path) {
    fs::create_dir_all(root.join("biology")).unwrap();
    fs::write(root.join("anatomy.txt"), ANATOMY).unwrap();
    fs::write(root.join("biology").join("cells.txt"), CELLS).unwrap();
    fs::write(root.join("notes.md"), "not a textbook").unwrap();
}

pub fn test_config(dir: &TempDir) -> RagConfig {
    RagConfig {
        chunk_size: 80,
        chunk_overlap: 16,
        batch_size: 2,
        ..RagConfig::default()
    }
    .with_base(dir.path())
}

/// Temp workspace with two textbooks and a config pointing into it.
pub fn fixture() -> (TempDir, RagConfig) {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    write_textbooks(&config.textbooks_dir);
    (dir, config)
}

pub fn retriever(config: &RagConfig, encoder: Arc<dyn Encoder>) -> Retriever {
    Retriever::new(IndexBuilder::from_config(config, encoder).quiet())
}

pub fn hashing() -> Arc<dyn Encoder> {
    Arc::new(HashingEncoder::new(DIM))
}

/// Hashing encoder that counts multi-text calls, which only index builds make.
pub struct CountingEncoder {
    inner: HashingEncoder,
    pub build_calls: AtomicUsize,
}

impl CountingEncoder {
    pub fn new() -> Self {
        Self { inner: HashingEncoder::new(DIM), build_calls: AtomicUsize::new(0) }
    }

    pub fn build_calls(&self) -> usize {
        self.build_calls.load(Ordering::SeqCst)
    }
}

impl Encoder for CountingEncoder {
    fn model_id(&self) -> &str {
        "counting"
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        if batch.len() > 1 {
            self.build_calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        self.inner.encode(batch)
    }
}

pub struct FailingEncoder;

impl Encoder for FailingEncoder {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn encode(&self, _batch: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Encoding("model unavailable".into()))
    }
}

/// Returns one vector too few for every batch.
pub struct ShortEncoder;

impl Encoder for ShortEncoder {
    fn model_id(&self) -> &str {
        "short"
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn encode(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![0.0; DIM]; batch.len().saturating_sub(1)])
    }
}
