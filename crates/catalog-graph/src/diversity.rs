//! Maximal Marginal Relevance selection.
//!
//! ```text
//! diversity = 0.0 -> pure relevance
//! diversity = 1.0 -> pure novelty
//! ```

use std::cmp::Ordering;

use crate::similarity::SimilarityMatrix;

/// Greedy MMR over corpus positions, using the shared similarity matrix.
#[derive(Debug, Clone, Copy)]
pub struct DiversitySelector<'a> {
    similarity: &'a SimilarityMatrix,
    pool_factor: usize,
}

impl<'a> DiversitySelector<'a> {
    pub fn new(similarity: &'a SimilarityMatrix) -> Self { Self { similarity, pool_factor: 3 } }

    /// Only the best `factor * k` candidates enter the greedy loop.
    pub fn with_pool_factor(mut self, factor: usize) -> Self {
        self.pool_factor = factor.max(1);
        self
    }

    /// Pick up to `k` candidates from `(position, relevance)` pairs.
    ///
    /// The first pick is always the most relevant candidate. Each later pick
    /// maximizes `(1 - diversity) * relevance - diversity * max_sim`, where
    /// `max_sim` is the highest similarity to anything already picked; on
    /// equal scores the more relevant candidate wins. Returned pairs keep
    /// their input relevance, in pick order.
    pub fn select(&self, candidates: &[(usize, f32)], k: usize, diversity: f32) -> Vec<(usize, f32)> {
        let mut pool: Vec<(usize, f32)> = candidates.to_vec();
        pool.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));

        if diversity <= 0.0 || pool.len() <= 1 {
            pool.truncate(k);
            return pool;
        }
        pool.truncate(k.saturating_mul(self.pool_factor));

        let mut selected: Vec<(usize, f32)> = Vec::with_capacity(k.min(pool.len()));
        let mut remaining = pool;
        while selected.len() < k && !remaining.is_empty() {
            let pick = if selected.is_empty() {
                0
            } else {
                let mut best = 0;
                let mut best_score = f32::NEG_INFINITY;
                for (slot, &(idx, rel)) in remaining.iter().enumerate() {
                    let max_sim = selected
                        .iter()
                        .map(|&(s, _)| self.similarity.get(idx, s))
                        .fold(f32::NEG_INFINITY, f32::max);
                    let score = (1.0 - diversity) * rel - diversity * max_sim;
                    if score > best_score {
                        best = slot;
                        best_score = score;
                    }
                }
                best
            };
            selected.push(remaining.remove(pick));
        }
        selected
    }
}
