use std::collections::BTreeSet;

use catalog_core::config::TraversalScoring;
use catalog_core::{Document, Error, RecommendationRequest};
use catalog_graph::centrality::{degree_centrality, pagerank, Subgraph};
use catalog_graph::{expand, recommendation_web, Expansion, ExpansionParams, GraphParams, SimilarityGraph};

fn app(id: i64, name: &str, downloads: u64) -> Document {
    let mut d = Document::new(id, name);
    d.category = "Tools".to_string();
    d.downloads = downloads;
    d
}

/// cos(A,B) = 0.9, cos(A,C) = 0.2, cos(B,C) = 0.1
fn triangle() -> (Vec<Document>, Vec<Vec<f32>>) {
    let docs = vec![app(1, "A", 10), app(2, "B", 30), app(3, "C", 20)];
    let by = (1.0f32 - 0.81).sqrt();
    let cy = (0.1 - 0.9 * 0.2) / by;
    let cz = (1.0 - 0.04 - cy * cy).sqrt();
    let embs = vec![vec![1.0, 0.0, 0.0], vec![0.9, by, 0.0], vec![0.2, cy, cz]];
    (docs, embs)
}

/// A - B - C path with no A - C edge.
fn chain() -> SimilarityGraph {
    let docs = vec![app(1, "A", 0), app(2, "B", 0), app(3, "C", 0)];
    let h = std::f32::consts::FRAC_1_SQRT_2;
    let embs = vec![vec![1.0, 0.0], vec![h, h], vec![0.0, 1.0]];
    SimilarityGraph::build(&docs, &embs, &GraphParams::default())
}

/// Seven identical items; every pair is maximally similar.
fn clique() -> SimilarityGraph {
    let docs: Vec<Document> = (0..7).map(|i| app(i, &format!("app{i}"), 0)).collect();
    let embs = vec![vec![1.0, 1.0, 0.0]; 7];
    SimilarityGraph::build(&docs, &embs, &GraphParams::default())
}

/// Isolated item 1 next to a 2 - 3 - 4 - 5 - 6 path (45 degrees per hop).
fn island_and_path() -> SimilarityGraph {
    let mut docs = vec![app(1, "island", 0)];
    let mut embs = vec![vec![0.0, 0.0, 1.0]];
    for (k, id) in (2..=6).enumerate() {
        let angle = k as f32 * std::f32::consts::FRAC_PI_4;
        docs.push(app(id, &format!("path{id}"), 0));
        embs.push(vec![angle.cos(), angle.sin(), 0.0]);
    }
    SimilarityGraph::build(&docs, &embs, &GraphParams::default())
}

fn ids(graph: &SimilarityGraph, nodes: impl IntoIterator<Item = usize>) -> Vec<i64> {
    nodes.into_iter().map(|n| graph.node(n).id).collect()
}

#[test]
fn graph_keeps_only_edges_above_threshold() {
    let (docs, embs) = triangle();
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 1);
    let edges = graph.edges();
    assert_eq!(edges.len(), 1);
    let (a, b, w) = edges[0];
    assert_eq!((graph.node(a).id, graph.node(b).id), (1, 2));
    assert!((w - 0.9).abs() < 1e-4);
    assert_eq!(graph.degree(2), 0);
}

#[test]
fn graph_is_symmetric_without_self_loops() {
    let graph = clique();
    for a in 0..graph.node_count() {
        assert!(graph.edge_weight(a, a).is_none());
        for (b, w) in graph.neighbors(a) {
            assert_eq!(graph.edge_weight(b, a), Some(w));
        }
    }
    assert_eq!(graph.edges().len(), graph.edge_count());
}

#[test]
fn neighbour_cap_applies_per_node_but_degree_is_symmetric() {
    let graph = clique();
    // 0..=5 form a complete graph; 6 links only to 0..=4.
    assert_eq!(graph.edge_count(), 20);
    assert_eq!(graph.degree(0), 6);
    assert_eq!(graph.degree(6), 5);
    assert!(graph.edge_weight(5, 6).is_none());
}

#[test]
fn graph_build_is_deterministic() {
    let (docs, embs) = triangle();
    let a = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    let b = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    assert_eq!(a.edges(), b.edges());
}

#[test]
fn empty_corpus_builds_empty_graph() {
    let graph = SimilarityGraph::build(&[], &[], &GraphParams::default());
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn web_for_single_seed_contains_its_neighbourhood() {
    let (docs, embs) = triangle();
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    let web = recommendation_web(&graph, &RecommendationRequest::new([1], 2, 20), &ExpansionParams::default())
        .expect("web");

    let node_ids: Vec<i64> = web.nodes.iter().map(|n| n.id).collect();
    assert_eq!(node_ids, vec![1, 2]);
    assert!(web.nodes[0].is_installed);
    assert!(!web.nodes[1].is_installed);
    assert_eq!(web.nodes[0].centrality, 1.0);
    assert_eq!(web.nodes[1].group, "Tools");

    assert_eq!(web.links.len(), 1);
    assert_eq!((web.links[0].source, web.links[0].target), (1, 2));
    assert!((web.links[0].similarity - 90.0).abs() < 0.11);

    assert_eq!(web.stats.total_nodes, 2);
    assert_eq!(web.stats.total_edges, 1);
    assert_eq!(web.stats.installed_apps, 1);
    assert_eq!(web.stats.recommended_apps, 1);
}

#[test]
fn unknown_seeds_fall_back_to_most_downloaded() {
    let (docs, embs) = triangle();
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    for seeds in [vec![999], vec![]] {
        let web = recommendation_web(&graph, &RecommendationRequest::new(seeds, 2, 2), &ExpansionParams::default())
            .expect("web");
        let node_ids: Vec<i64> = web.nodes.iter().map(|n| n.id).collect();
        assert_eq!(node_ids, vec![2, 3]);
        assert!(web.links.is_empty());
        assert!(web.nodes.iter().all(|n| !n.is_installed && n.centrality == 0.5));
        assert_eq!(web.stats.installed_apps, 0);
        assert_eq!(web.stats.recommended_apps, 2);
        assert_eq!(web.stats.total_edges, 0);
    }
}

#[test]
fn fallback_keeps_catalog_order_on_equal_downloads() {
    let docs = vec![app(5, "E", 7), app(3, "C", 7), app(9, "I", 1)];
    let embs = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    let web = recommendation_web(&graph, &RecommendationRequest::new(Vec::new(), 1, 10), &ExpansionParams::default())
        .expect("web");
    let node_ids: Vec<i64> = web.nodes.iter().map(|n| n.id).collect();
    assert_eq!(node_ids, vec![5, 3, 9]);
}

#[test]
fn depth_outside_limits_is_rejected() {
    let graph = chain();
    for depth in [0, 6] {
        let err = expand(&graph, &BTreeSet::from([1]), depth, 10, &ExpansionParams::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}

#[test]
fn seed_edge_scoring_skips_nodes_not_adjacent_to_seed() {
    let graph = chain();
    let seed_edge = ExpansionParams::default();
    assert_eq!(seed_edge.traversal, TraversalScoring::SeedEdge);
    let out = expand(&graph, &BTreeSet::from([1]), 2, 10, &seed_edge).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), vec![2]);

    let parent_edge = ExpansionParams { traversal: TraversalScoring::ParentEdge, ..seed_edge };
    let out = expand(&graph, &BTreeSet::from([1]), 2, 10, &parent_edge).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), vec![2, 3]);
}

#[test]
fn isolated_seed_does_not_cut_later_seeds_short() {
    let graph = island_and_path();
    let seeds = BTreeSet::from([1, 2]);
    let parent_edge = ExpansionParams { traversal: TraversalScoring::ParentEdge, ..ExpansionParams::default() };
    let out = expand(&graph, &seeds, 3, 10, &parent_edge).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), vec![3, 4, 5, 6]);

    let out = expand(&graph, &seeds, 3, 10, &ExpansionParams::default()).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), vec![3]);
}

#[test]
fn unbounded_recommendation_budget_keeps_everything() {
    let (docs, embs) = triangle();
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    let web = recommendation_web(&graph, &RecommendationRequest::new([1], 1, usize::MAX), &ExpansionParams::default())
        .expect("web");
    let node_ids: Vec<i64> = web.nodes.iter().map(|n| n.id).collect();
    assert_eq!(node_ids, vec![1, 2]);
    assert_eq!(web.stats.recommended_apps, 1);

    let out = expand(&graph, &BTreeSet::from([1, 2]), 2, usize::MAX, &ExpansionParams::default()).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), Vec::<i64>::new());
}

#[test]
fn fanout_limits_each_depth() {
    let graph = clique();
    let out = expand(&graph, &BTreeSet::from([0]), 1, 20, &ExpansionParams::default()).expect("expand");
    assert_eq!(ids(&graph, out.recommended()), vec![1, 2, 3, 4, 5]);

    let out = expand(&graph, &BTreeSet::from([0]), 2, 20, &ExpansionParams::default()).expect("expand");
    assert_eq!(out.recommended().len(), 6);
}

#[test]
fn oversized_expansion_is_pruned_to_budget() {
    let graph = clique();
    let out = expand(&graph, &BTreeSet::from([0]), 2, 3, &ExpansionParams::default()).expect("expand");
    let Expansion::Neighborhood { seeds, included } = &out else { panic!("expected neighbourhood") };
    assert_eq!(seeds, &vec![0]);
    assert!(included.contains(&0));
    let kept = ids(&graph, out.recommended());
    assert_eq!(kept.len(), 3);
    // The two lower-degree nodes lose to the fully connected ones.
    assert!(kept.iter().all(|id| (1..=4).contains(id)), "kept {kept:?}");
}

#[test]
fn seeds_never_count_as_recommendations() {
    let graph = clique();
    let out = expand(&graph, &BTreeSet::from([0, 1, 42]), 2, 2, &ExpansionParams::default()).expect("expand");
    let recommended = out.recommended();
    assert_eq!(recommended.len(), 2);
    assert!(!recommended.contains(&0) && !recommended.contains(&1));

    let web = recommendation_web(&graph, &RecommendationRequest::new([0, 1, 42], 2, 2), &ExpansionParams::default())
        .expect("web");
    assert_eq!(web.stats.installed_apps, 2);
    assert_eq!(web.stats.recommended_apps, 2);
}

#[test]
fn centrality_on_path() {
    let graph = chain();
    let sub = Subgraph::new(&graph, 0..3);
    assert_eq!(degree_centrality(&sub), vec![0.5, 1.0, 0.5]);

    let ranks = pagerank(&sub, 0.85, 100, 1e-6);
    let total: f64 = ranks.iter().sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert!(ranks[1] > ranks[0]);
    assert!((ranks[0] - ranks[2]).abs() < 1e-9);
}

#[test]
fn lone_node_is_fully_central() {
    let graph = chain();
    assert_eq!(degree_centrality(&Subgraph::new(&graph, [1])), vec![1.0]);
    assert!(degree_centrality(&Subgraph::new(&graph, [])).is_empty());
    assert!(pagerank(&Subgraph::new(&graph, []), 0.85, 100, 1e-6).is_empty());

    let graph = island_and_path();
    let web = recommendation_web(&graph, &RecommendationRequest::new([1], 1, 10), &ExpansionParams::default())
        .expect("web");
    assert_eq!(web.nodes.len(), 1);
    assert_eq!(web.nodes[0].centrality, 1.0);
    assert!(web.links.is_empty());
}

#[test]
fn web_serializes_for_the_frontend() {
    let (docs, embs) = triangle();
    let graph = SimilarityGraph::build(&docs, &embs, &GraphParams::default());
    let web = recommendation_web(&graph, &RecommendationRequest::new([1], 1, 5), &ExpansionParams::default())
        .expect("web");
    let json = serde_json::to_value(&web).expect("json");
    assert_eq!(json["stats"]["total_nodes"], 2);
    assert_eq!(json["nodes"][0]["is_installed"], true);
    assert_eq!(json["links"][0]["source"], 1);
}
