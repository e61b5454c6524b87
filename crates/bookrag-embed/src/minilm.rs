use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use bookrag_core::config::RagConfig;
use bookrag_core::traits::Encoder;
use bookrag_core::Error;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch;

const MAX_LEN: usize = 256;

/// Sentence-transformers BERT encoder (e.g. all-MiniLM-L6-v2) loaded from local files.
pub struct MiniLmEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dim: usize,
}

impl MiniLmEncoder {
    pub fn load(config: &RagConfig) -> bookrag_core::Result<Self> {
        let model_dir = resolve_model_dir(config)?;
        Self::from_dir(&model_dir, &config.model_name)
            .map_err(|e| Error::Encoding(format!("Failed to load {}: {e:#}", config.model_name)))
    }

    pub fn from_dir(model_dir: &Path, model_id: &str) -> Result<Self> {
        let device = select_device();
        info!(model = model_id, dir = %model_dir.display(), "Loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        tokenizer.with_padding(Some(PaddingParams { strategy: PaddingStrategy::BatchLongest, ..Default::default() }));
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: MAX_LEN, ..Default::default() }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let dim = config.hidden_size;

        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        info!(dim, "Embedding model loaded");
        Ok(Self { model, tokenizer, device, model_id: model_id.to_string(), dim })
    }

    fn encode_inner(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_batch(&self.tokenizer, batch, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_dtype(DType::F32)?.to_vec2()?;
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 * batch.len() as u128 {
            warn!(?elapsed, batch = batch.len(), "Slow embedding");
        } else {
            debug!(?elapsed, batch = batch.len(), "Embedded batch");
        }
        Ok(vectors)
    }
}

impl Encoder for MiniLmEncoder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, batch: &[String]) -> bookrag_core::Result<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Err(Error::Encoding("cannot encode an empty batch".into()));
        }
        let vectors = self.encode_inner(batch).map_err(|e| Error::Encoding(format!("{e:#}")))?;
        if vectors.len() != batch.len() {
            return Err(Error::Encoding(format!("got {} vectors for {} inputs", vectors.len(), batch.len())));
        }
        Ok(vectors)
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        return Ok(candle_core::pickle::read_all(&pickle)?.into_iter().collect());
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

/// Locate model files: `APP_MODEL_DIR`, then `<models_dir>/<model name>`, then
/// `model_name` itself as a path.
fn resolve_model_dir(config: &RagConfig) -> bookrag_core::Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            info!("Using APP_MODEL_DIR: {}", p.display());
            return Ok(p);
        }
    }
    let short_name = config.model_name.rsplit('/').next().unwrap_or(&config.model_name);
    let candidates = [config.models_dir.join(short_name), config.models_dir.join(&config.model_name), PathBuf::from(&config.model_name)];
    for candidate in candidates {
        if candidate.join("config.json").exists() {
            return Ok(candidate);
        }
    }
    Err(Error::NotFound(format!(
        "model files for {} (checked APP_MODEL_DIR and {})",
        config.model_name,
        config.models_dir.display()
    )))
}
