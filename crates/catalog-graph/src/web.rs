//! Node/link payload for the recommendation-web visualization.

use std::cmp::Reverse;

use catalog_core::types::round_to;
use catalog_core::{AppId, RecommendationRequest, Result};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::centrality::{degree_centrality, Subgraph};
use crate::expansion::{expand, Expansion, ExpansionParams};
use crate::graph::{similarity_percent, GraphNode, SimilarityGraph};

/// Centrality reported for every node of the popularity fallback.
const FALLBACK_CENTRALITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebNode {
    pub id: AppId,
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub downloads: u64,
    pub icon_url: String,
    pub is_free: bool,
    pub is_installed: bool,
    pub centrality: f64,
    /// Grouping key for the front-end; the category.
    pub group: String,
}

impl WebNode {
    fn new(node: &GraphNode, is_installed: bool, centrality: f64) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            category: node.category.clone(),
            rating: node.rating,
            downloads: node.downloads,
            icon_url: node.icon_url.clone(),
            is_free: node.is_free,
            is_installed,
            centrality,
            group: node.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebLink {
    pub source: AppId,
    pub target: AppId,
    pub weight: f32,
    /// Edge weight as a percentage, one decimal.
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WebStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub installed_apps: usize,
    pub recommended_apps: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendationWeb {
    pub nodes: Vec<WebNode>,
    pub links: Vec<WebLink>,
    pub stats: WebStats,
}

/// Build the recommendation web for `request`.
///
/// When none of the installed ids exist in the graph the web degrades to
/// the most downloaded items, without links.
#[instrument(skip_all, fields(seeds = request.installed_ids.len(), depth = request.max_depth))]
pub fn recommendation_web(
    graph: &SimilarityGraph,
    request: &RecommendationRequest,
    params: &ExpansionParams,
) -> Result<RecommendationWeb> {
    let expansion = expand(graph, &request.installed_ids, request.max_depth, request.max_recommendations, params)?;
    let web = match expansion {
        Expansion::NoSeeds => popular_web(graph, request.max_recommendations),
        Expansion::Neighborhood { seeds, included } => neighborhood_web(graph, &seeds, included),
    };
    debug!(nodes = web.stats.total_nodes, edges = web.stats.total_edges, "recommendation web built");
    Ok(web)
}

fn neighborhood_web(
    graph: &SimilarityGraph,
    seeds: &[usize],
    included: impl IntoIterator<Item = usize>,
) -> RecommendationWeb {
    let sub = Subgraph::new(graph, included);
    let centrality = degree_centrality(&sub);

    let nodes: Vec<WebNode> = sub
        .members()
        .iter()
        .zip(&centrality)
        .map(|(&idx, &c)| WebNode::new(graph.node(idx), seeds.contains(&idx), round_to(c, 3)))
        .collect();

    let mut links = Vec::new();
    for (l, &a) in sub.members().iter().enumerate() {
        for (lj, weight) in sub.neighbors(l) {
            let b = sub.member(lj);
            if a < b {
                links.push(WebLink {
                    source: graph.node(a).id,
                    target: graph.node(b).id,
                    weight,
                    similarity: similarity_percent(weight),
                });
            }
        }
    }

    let installed = nodes.iter().filter(|n| n.is_installed).count();
    let stats = WebStats {
        total_nodes: nodes.len(),
        total_edges: links.len(),
        installed_apps: installed,
        recommended_apps: nodes.len() - installed,
    };
    RecommendationWeb { nodes, links, stats }
}

fn popular_web(graph: &SimilarityGraph, limit: usize) -> RecommendationWeb {
    let mut ranked: Vec<&GraphNode> = graph.nodes().iter().collect();
    // Stable: equal download counts keep catalog order.
    ranked.sort_by_key(|n| Reverse(n.downloads));

    let nodes: Vec<WebNode> =
        ranked.into_iter().take(limit).map(|n| WebNode::new(n, false, FALLBACK_CENTRALITY)).collect();
    let stats = WebStats { total_nodes: nodes.len(), total_edges: 0, installed_apps: 0, recommended_apps: nodes.len() };
    RecommendationWeb { nodes, links: Vec::new(), stats }
}
