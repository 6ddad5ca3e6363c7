//! Centrality measures over an induced subgraph of the similarity graph.
//!
//! Both measures are computed on the subgraph alone: edges to nodes outside
//! the member set are ignored.

use std::collections::HashMap;

use tracing::warn;

use crate::graph::SimilarityGraph;

/// Subgraph induced by a set of arena indices. Local indices follow the
/// ascending order of the members.
pub struct Subgraph<'g> {
    graph: &'g SimilarityGraph,
    members: Vec<usize>,
    local: HashMap<usize, usize>,
}

impl<'g> Subgraph<'g> {
    pub fn new(graph: &'g SimilarityGraph, members: impl IntoIterator<Item = usize>) -> Self {
        let mut members: Vec<usize> = members.into_iter().filter(|&m| m < graph.node_count()).collect();
        members.sort_unstable();
        members.dedup();
        let local = members.iter().enumerate().map(|(l, &m)| (m, l)).collect();
        Self { graph, members, local }
    }

    pub fn len(&self) -> usize { self.members.len() }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// Arena index of local node `l`.
    pub fn member(&self, l: usize) -> usize { self.members[l] }

    pub fn members(&self) -> &[usize] { &self.members }

    /// Local neighbours of local node `l`, restricted to members.
    pub fn neighbors(&self, l: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.graph
            .neighbors(self.members[l])
            .filter_map(|(j, w)| self.local.get(&j).map(|&lj| (lj, w)))
    }
}

/// Degree centrality `deg(v) / (n - 1)`. A lone node scores 1.
pub fn degree_centrality(sub: &Subgraph<'_>) -> Vec<f64> {
    let n = sub.len();
    if n <= 1 { return vec![1.0; n]; }
    let norm = (n - 1) as f64;
    (0..n).map(|l| sub.neighbors(l).count() as f64 / norm).collect()
}

/// Weighted PageRank by power iteration.
///
/// Each node spreads its rank over its edges proportionally to edge weight;
/// nodes without edges in the subgraph spread theirs uniformly. Converges
/// when the L1 change drops below `n * tol`; otherwise the last iterate is
/// returned.
pub fn pagerank(sub: &Subgraph<'_>, damping: f64, max_iter: usize, tol: f64) -> Vec<f64> {
    let n = sub.len();
    if n == 0 { return Vec::new(); }

    let adjacency: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|l| sub.neighbors(l).map(|(j, w)| (j, f64::from(w))).collect())
        .collect();
    let out_weight: Vec<f64> = adjacency.iter().map(|nbrs| nbrs.iter().map(|(_, w)| w).sum()).collect();

    let uniform = 1.0 / n as f64;
    let mut ranks = vec![uniform; n];
    let mut next = vec![0.0; n];

    for _ in 0..max_iter {
        let dangling: f64 = (0..n).filter(|&v| out_weight[v] <= 0.0).map(|v| ranks[v]).sum();
        let base = (1.0 - damping) * uniform + damping * dangling * uniform;
        next.iter_mut().for_each(|x| *x = base);

        for (u, nbrs) in adjacency.iter().enumerate() {
            if out_weight[u] <= 0.0 { continue; }
            let share = damping * ranks[u] / out_weight[u];
            for &(v, w) in nbrs {
                next[v] += share * w;
            }
        }

        let diff: f64 = ranks.iter().zip(next.iter()).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut ranks, &mut next);
        if diff < n as f64 * tol {
            return ranks;
        }
    }

    warn!(nodes = n, max_iter, "pagerank did not converge; using last iterate");
    ranks
}
