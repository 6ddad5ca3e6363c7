use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use catalog_core::config::GraphSettings;
use catalog_core::types::round_to;
use catalog_core::{AppId, Document};
use serde::Serialize;
use tracing::{info, instrument};

use crate::similarity::SimilarityMatrix;

/// Denormalized projection of a document carried by each graph node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: AppId,
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub downloads: u64,
    pub icon_url: String,
    pub is_free: bool,
}

impl From<&Document> for GraphNode {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone(),
            category: doc.category.clone(),
            rating: doc.rating,
            downloads: doc.downloads,
            icon_url: doc.icon_url.clone(),
            is_free: doc.is_free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphParams {
    /// Strongest neighbours considered per node.
    pub neighbors_per_node: usize,
    /// Edges are added only when similarity is strictly above this.
    pub edge_threshold: f32,
}

impl Default for GraphParams {
    fn default() -> Self { Self { neighbors_per_node: 5, edge_threshold: 0.5 } }
}

impl From<&GraphSettings> for GraphParams {
    fn from(s: &GraphSettings) -> Self {
        Self { neighbors_per_node: s.neighbors_per_node, edge_threshold: s.edge_threshold }
    }
}

/// Edge weight expressed as a percentage with one decimal.
pub fn similarity_percent(weight: f32) -> f64 {
    round_to(f64::from(weight) * 100.0, 1)
}

/// Undirected weighted graph over catalog items.
///
/// Nodes live in an arena indexed by corpus position; adjacency maps are
/// ordered so every traversal is deterministic. No self-loops, and every
/// edge is stored symmetrically with a single weight.
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    nodes: Vec<GraphNode>,
    positions: HashMap<AppId, usize>,
    adjacency: Vec<BTreeMap<usize, f32>>,
    edge_count: usize,
}

impl SimilarityGraph {
    pub fn build(documents: &[Document], embeddings: &[Vec<f32>], params: &GraphParams) -> Self {
        let similarity = SimilarityMatrix::compute(embeddings);
        Self::build_with_matrix(documents, &similarity, params)
    }

    /// Link every document to its strongest neighbours above the threshold.
    #[instrument(skip_all, fields(docs = documents.len()))]
    pub fn build_with_matrix(documents: &[Document], similarity: &SimilarityMatrix, params: &GraphParams) -> Self {
        let n = documents.len().min(similarity.len());
        let mut graph = Self {
            nodes: documents[..n].iter().map(GraphNode::from).collect(),
            positions: documents[..n].iter().enumerate().map(|(i, d)| (d.id, i)).collect(),
            adjacency: vec![BTreeMap::new(); n],
            edge_count: 0,
        };

        for i in 0..n {
            let row = similarity.row(i);
            let mut ranked: Vec<(usize, f32)> = (0..n).filter(|&j| j != i).map(|j| (j, row[j])).collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
            for &(j, s) in ranked.iter().take(params.neighbors_per_node) {
                if s > params.edge_threshold {
                    graph.add_edge(i, j, s);
                }
            }
        }

        info!(nodes = graph.node_count(), edges = graph.edge_count(), "similarity graph built");
        graph
    }

    /// Insert or overwrite the undirected edge `a - b`. Re-adding an existing
    /// pair leaves the edge count unchanged. Returns whether the edge is new.
    fn add_edge(&mut self, a: usize, b: usize, weight: f32) -> bool {
        if a == b { return false; }
        let is_new = self.adjacency[a].insert(b, weight).is_none();
        self.adjacency[b].insert(a, weight);
        if is_new { self.edge_count += 1; }
        is_new
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }

    pub fn edge_count(&self) -> usize { self.edge_count }

    pub fn node(&self, idx: usize) -> &GraphNode { &self.nodes[idx] }

    pub fn nodes(&self) -> &[GraphNode] { &self.nodes }

    pub fn position(&self, id: AppId) -> Option<usize> { self.positions.get(&id).copied() }

    pub fn contains(&self, id: AppId) -> bool { self.positions.contains_key(&id) }

    /// Neighbours of `idx` in ascending arena order with their edge weights.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.adjacency[idx].iter().map(|(&j, &w)| (j, w))
    }

    pub fn degree(&self, idx: usize) -> usize { self.adjacency[idx].len() }

    pub fn edge_weight(&self, a: usize, b: usize) -> Option<f32> { self.adjacency.get(a)?.get(&b).copied() }

    /// Every edge once, as `(a, b, weight)` with `a < b`, in arena order.
    pub fn edges(&self) -> Vec<(usize, usize, f32)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(a, nbrs)| nbrs.range(a + 1..).map(move |(&b, &w)| (a, b, w)))
            .collect()
    }
}
