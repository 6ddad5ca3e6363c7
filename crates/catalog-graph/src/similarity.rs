use catalog_core::math::cosine;
use tracing::debug;

/// Dense, symmetric cosine-similarity matrix over corpus embeddings.
///
/// Indexed by corpus position. O(n²) memory and time, which is fine for a
/// catalog-sized corpus and is paid once per reindex.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn compute(embeddings: &[Vec<f32>]) -> Self {
        let n = embeddings.len();
        let mut values = vec![0.0f32; n * n];
        for i in 0..n {
            values[i * n + i] = if embeddings[i].iter().any(|x| *x != 0.0) { 1.0 } else { 0.0 };
            for j in (i + 1)..n {
                let s = cosine(&embeddings[i], &embeddings[j]);
                values[i * n + j] = s;
                values[j * n + i] = s;
            }
        }
        debug!(n, "computed pairwise similarity matrix");
        Self { n, values }
    }

    pub fn len(&self) -> usize { self.n }

    pub fn is_empty(&self) -> bool { self.n == 0 }

    pub fn get(&self, i: usize, j: usize) -> f32 { self.values[i * self.n + j] }

    pub fn row(&self, i: usize) -> &[f32] { &self.values[i * self.n..(i + 1) * self.n] }
}
