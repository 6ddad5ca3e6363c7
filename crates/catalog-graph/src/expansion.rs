//! Bounded multi-hop expansion from seed items, pruned to a size budget.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use catalog_core::config::{GraphSettings, TraversalScoring};
use catalog_core::{AppId, Error, Result};
use tracing::debug;

use crate::centrality::{pagerank, Subgraph};
use crate::graph::SimilarityGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionParams {
    /// Nodes added per seed per depth.
    pub fanout: usize,
    pub max_depth_limit: usize,
    pub traversal: TraversalScoring,
    pub pagerank_damping: f64,
    pub pagerank_max_iter: usize,
    pub pagerank_tolerance: f64,
}

impl Default for ExpansionParams {
    fn default() -> Self { Self::from(&GraphSettings::default()) }
}

impl From<&GraphSettings> for ExpansionParams {
    fn from(s: &GraphSettings) -> Self {
        Self {
            fanout: s.expansion_fanout,
            max_depth_limit: s.max_depth_limit,
            traversal: s.traversal,
            pagerank_damping: s.pagerank_damping,
            pagerank_max_iter: s.pagerank_max_iter,
            pagerank_tolerance: s.pagerank_tolerance,
        }
    }
}

/// Outcome of an expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// None of the requested seeds exist in the graph.
    NoSeeds,
    Neighborhood {
        /// Arena indices of the valid seeds, ascending by item id.
        seeds: Vec<usize>,
        /// Seeds plus the recommended nodes.
        included: BTreeSet<usize>,
    },
}

impl Expansion {
    /// Included nodes that are not seeds.
    pub fn recommended(&self) -> Vec<usize> {
        match self {
            Expansion::NoSeeds => Vec::new(),
            Expansion::Neighborhood { seeds, included } => {
                included.iter().copied().filter(|n| !seeds.contains(n)).collect()
            }
        }
    }
}

/// Expand `seed_ids` up to `max_depth` hops and prune to
/// `max_recommendations` non-seed nodes by PageRank.
///
/// Seeds are processed in ascending id order; at each depth at most
/// `params.fanout` new nodes are added, best score first with ties going
/// to the lower item id. With `TraversalScoring::SeedEdge`, a candidate
/// found at depth >= 2 is scored by its edge to the seed being expanded
/// and skipped when there is no such edge.
pub fn expand(
    graph: &SimilarityGraph,
    seed_ids: &BTreeSet<AppId>,
    max_depth: usize,
    max_recommendations: usize,
    params: &ExpansionParams,
) -> Result<Expansion> {
    if max_depth == 0 || max_depth > params.max_depth_limit {
        return Err(Error::invalid_request(format!(
            "max_depth must be within 1..={}, got {}",
            params.max_depth_limit, max_depth
        )));
    }

    let seeds: Vec<usize> = seed_ids.iter().filter_map(|&id| graph.position(id)).collect();
    if seeds.is_empty() {
        debug!(requested = seed_ids.len(), "no requested seed present in graph");
        return Ok(Expansion::NoSeeds);
    }
    let seed_set: HashSet<usize> = seeds.iter().copied().collect();
    let mut included: BTreeSet<usize> = seeds.iter().copied().collect();

    for &seed in &seeds {
        for depth in 1..=max_depth {
            let frontier: Vec<usize> = if depth == 1 { vec![seed] } else { included.iter().copied().collect() };

            let mut scored: HashMap<usize, f32> = HashMap::new();
            for node in frontier {
                for (candidate, via) in graph.neighbors(node) {
                    if seed_set.contains(&candidate) || included.contains(&candidate) { continue; }
                    let score = match params.traversal {
                        TraversalScoring::SeedEdge => match graph.edge_weight(seed, candidate) {
                            Some(w) => w,
                            None => continue,
                        },
                        TraversalScoring::ParentEdge => via,
                    };
                    scored.entry(candidate).and_modify(|s| *s = s.max(score)).or_insert(score);
                }
            }
            if scored.is_empty() {
                // Past depth 1 the frontier is everything included, so an
                // empty round means every later round is empty too.
                if depth > 1 { break; }
                continue;
            }

            let mut ranked: Vec<(usize, f32)> = scored.into_iter().collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| graph.node(a.0).id.cmp(&graph.node(b.0).id))
            });
            for (candidate, _) in ranked.into_iter().take(params.fanout) {
                included.insert(candidate);
            }
        }
    }

    let budget = max_recommendations.saturating_add(seeds.len());
    if included.len() > budget {
        included = prune_by_pagerank(graph, &seeds, &included, max_recommendations, params);
    }

    debug!(seeds = seeds.len(), included = included.len(), "expansion complete");
    Ok(Expansion::Neighborhood { seeds, included })
}

/// Keep the seeds plus the `keep` most central non-seed nodes.
fn prune_by_pagerank(
    graph: &SimilarityGraph,
    seeds: &[usize],
    included: &BTreeSet<usize>,
    keep: usize,
    params: &ExpansionParams,
) -> BTreeSet<usize> {
    let sub = Subgraph::new(graph, included.iter().copied());
    let ranks = pagerank(&sub, params.pagerank_damping, params.pagerank_max_iter, params.pagerank_tolerance);

    let mut candidates: Vec<(usize, f64)> = (0..sub.len())
        .map(|l| (sub.member(l), ranks[l]))
        .filter(|(node, _)| !seeds.contains(node))
        .collect();
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| graph.node(a.0).id.cmp(&graph.node(b.0).id))
    });

    let mut pruned: BTreeSet<usize> = seeds.iter().copied().collect();
    pruned.extend(candidates.into_iter().take(keep).map(|(node, _)| node));
    pruned
}
