//! Seams to the collaborators that live outside the ranking core.

/// Maps text to fixed-dimension, L2-normalized vectors.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Stable identifier for the provider/model, reported in search metadata.
    fn model_id(&self) -> &str;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Nearest-neighbour search by inner product over corpus vectors.
///
/// Results are `(doc_index, inner_product)` ordered best first.
pub trait VectorIndex: Send + Sync {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    fn search_vec(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<(usize, f32)>>;
}

/// Builds a `VectorIndex` from corpus vectors during reindex.
pub trait VectorIndexBuilder: Send + Sync {
    fn build_index(&self, vectors: &[Vec<f32>]) -> anyhow::Result<Box<dyn VectorIndex>>;
}

/// Term-based scorer returning `(doc_index, score)` with `score > 0`, best first.
pub trait TextScorer: Send + Sync {
    fn top_k(&self, query: &str, k: usize) -> anyhow::Result<Vec<(usize, f32)>>;
}
