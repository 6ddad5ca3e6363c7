//! catalog-vector
//!
//! Exact inner-product index over corpus embeddings. Catalogs are small
//! enough for a flat scan; an approximate index can be substituted behind
//! the same `VectorIndex` / `VectorIndexBuilder` traits.

use std::cmp::Ordering;

use anyhow::{bail, Result};
use catalog_core::math::dot;
use catalog_core::traits::{VectorIndex, VectorIndexBuilder};
use tracing::debug;

pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dim = vectors.first().map_or(0, Vec::len);
        if let Some(pos) = vectors.iter().position(|v| v.len() != dim) {
            bail!("vector {} has dimension {}, expected {}", pos, vectors[pos].len(), dim);
        }
        debug!(vectors = vectors.len(), dim, "built flat inner-product index");
        Ok(Self { dim, vectors })
    }

    pub fn dim(&self) -> usize { self.dim }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize { self.vectors.len() }

    fn search_vec(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if self.vectors.is_empty() || k == 0 { return Ok(Vec::new()); }
        if query.len() != self.dim {
            bail!("query has dimension {}, index expects {}", query.len(), self.dim);
        }
        let mut hits: Vec<(usize, f32)> = self.vectors.iter().enumerate().map(|(i, v)| (i, dot(query, v))).collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        Ok(hits)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatIndexBuilder;

impl VectorIndexBuilder for FlatIndexBuilder {
    fn build_index(&self, vectors: &[Vec<f32>]) -> Result<Box<dyn VectorIndex>> {
        Ok(Box::new(FlatIndex::new(vectors.to_vec())?))
    }
}
