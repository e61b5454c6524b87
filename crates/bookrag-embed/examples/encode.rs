use bookrag_core::config::Config;
use bookrag_embed::default_encoder;

fn main() -> anyhow::Result<()> {
    let config = Config::load()?.rag()?;
    let encoder = default_encoder(&config)?;
    let texts = vec!["The femur is the longest bone.".to_string(), "Mitochondria produce ATP.".to_string()];
    let embs = encoder.encode(&texts)?;
    println!("model={} B={} dim={}", encoder.model_id(), embs.len(), encoder.dim());
    Ok(())
}
