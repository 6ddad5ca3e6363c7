//! catalog-embed
//!
//! Embedding providers. The neural encoder used in production lives outside
//! this workspace; `HashingEmbedder` is a deterministic, dependency-light
//! stand-in that satisfies the same contract (fixed dimension, L2-normalized)
//! for development, the CLI and tests.

use std::hash::{Hash, Hasher};

use anyhow::Result;
use catalog_core::config::EmbeddingSettings;
use catalog_core::math::l2_normalize;
use catalog_core::traits::Embedder;
use tracing::info;
use twox_hash::XxHash64;

/// Feature-hashing embedder: each token lands in a bucket chosen by its
/// xxHash64, weighted by the upper hash bits. Texts sharing vocabulary end
/// up close in cosine space.
pub struct HashingEmbedder {
    dim: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1), model_id: format!("hashing-xxh64:d{}", dim.max(1)) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty());
        for (i, token) in tokens.enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 0.5 + val + (i as f32 % 3.0) * 0.01;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn model_id(&self) -> &str { &self.model_id }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Provider selected by configuration.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    info!(model = %settings.model, dim = settings.dim, "using hashing embedder");
    Ok(Box::new(HashingEmbedder::new(settings.dim)))
}
