use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Tokenize a batch into `(input_ids, attention_mask)`, both `[B, T]` u32.
///
/// Padding and truncation come from the tokenizer's own settings, so every
/// row has the same length.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], device: &Device) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = Vec::with_capacity(encodings.len());
    let mut masks = Vec::with_capacity(encodings.len());
    for enc in &encodings {
        ids.push(Tensor::new(enc.get_ids(), device)?);
        masks.push(Tensor::new(enc.get_attention_mask(), device)?);
    }
    Ok((Tensor::stack(&ids, 0)?, Tensor::stack(&masks, 0)?))
}
