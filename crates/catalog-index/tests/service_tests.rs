use std::sync::Arc;

use catalog_core::config::Settings;
use catalog_core::traits::Embedder;
use catalog_core::{Document, Error, MatchType, RecommendationRequest, UserProfile};
use catalog_embed::HashingEmbedder;
use catalog_hybrid::{SearchRequest, METADATA_VERSION};
use catalog_index::CatalogService;
use catalog_vector::FlatIndexBuilder;

/// Query vectors are irrelevant to these tests; only the dimension matters.
struct FixedEmbedder;

impl Embedder for FixedEmbedder {
    fn dim(&self) -> usize { 3 }
    fn model_id(&self) -> &str { "fixed" }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

fn service() -> CatalogService {
    CatalogService::new(Settings::default(), Arc::new(FixedEmbedder), Arc::new(FlatIndexBuilder))
}

fn app(id: i64, name: &str, downloads: u64) -> Document {
    let mut d = Document::new(id, name);
    d.category = "Tools".to_string();
    d.downloads = downloads;
    d
}

/// A, B, C with cos(A,B) = 0.9, cos(A,C) = 0.2, cos(B,C) = 0.1.
fn triangle() -> (Vec<Document>, Vec<Vec<f32>>) {
    let docs = vec![app(1, "Alpha", 100), app(2, "Bravo", 50), app(3, "Charlie", 10)];
    let by = (1.0f32 - 0.81).sqrt();
    let cy = (0.1 - 0.9 * 0.2) / by;
    let cz = (1.0 - 0.04 - cy * cy).sqrt();
    (docs, vec![vec![1.0, 0.0, 0.0], vec![0.9, by, 0.0], vec![0.2, cy, cz]])
}

fn catalog() -> Vec<Document> {
    let mut notes = Document::new(1, "Super App");
    notes.developer = "Acme".into();
    notes.description = "The super app for notes and tasks".into();
    notes.category = "Productivity".into();
    let mut weather = Document::new(2, "Weather Forecast");
    weather.developer = "Skyline".into();
    weather.description = "Hourly forecast and radar maps".into();
    weather.category = "Weather".into();
    weather.is_free = false;
    let mut todo = Document::new(3, "Task Planner");
    todo.developer = "Acme".into();
    todo.description = "Plan tasks and notes for the week".into();
    todo.category = "Productivity".into();
    vec![notes, weather, todo]
}

#[test]
fn everything_fails_before_first_publish() {
    let svc = service();
    assert!(matches!(svc.snapshot(), Err(Error::NotInitialized)));
    assert!(matches!(svc.search(&SearchRequest::new("notes")), Err(Error::NotInitialized)));
    assert!(matches!(svc.fuse_search("notes", 5, 0.5, None, None), Err(Error::NotInitialized)));
    assert!(matches!(
        svc.recommendation_web(&RecommendationRequest::new([1], 1, 10)),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(
        svc.personalized_recommendations(&UserProfile::default(), 5, None),
        Err(Error::NotInitialized)
    ));
    assert!(matches!(svc.similar_apps(1, 5), Err(Error::NotInitialized)));

    let health = svc.health();
    assert!(!health.initialized);
    assert_eq!(health.generation, None);
    assert_eq!(health.index_size, 0);
}

#[test]
fn recommendation_web_scenario() {
    let svc = service();
    let (docs, embs) = triangle();
    svc.reindex(docs, embs).expect("reindex");

    let web = svc.recommendation_web(&RecommendationRequest::new([1], 1, 10)).expect("web");
    let ids: Vec<i64> = web.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(web.links.len(), 1);
    assert_eq!(web.stats.installed_apps, 1);
    assert_eq!(web.stats.recommended_apps, 1);

    let fallback = svc.recommendation_web(&RecommendationRequest::new([77], 2, 2)).expect("web");
    let ids: Vec<i64> = fallback.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(fallback.links.is_empty());
}

#[test]
fn build_graph_matches_the_published_one() {
    let svc = service();
    let (docs, embs) = triangle();
    let standalone = svc.build_graph(&docs, &embs);
    svc.reindex(docs, embs).expect("reindex");
    assert_eq!(standalone.edges(), svc.snapshot().expect("snapshot").graph.edges());
}

#[test]
fn keyword_only_search_ranks_exact_match_first() {
    let svc = service();
    let docs = vec![app(1, "Super App", 0), app(2, "Weather Forecast", 0)];
    svc.reindex(docs, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).expect("reindex");

    let candidates = svc.fuse_search("super app", 10, 0.0, None, None).expect("search");
    assert_eq!(candidates[0].doc_index, 0);
    assert_eq!(candidates[0].match_type, MatchType::Keyword);
    assert!(candidates.iter().all(|c| c.doc_index != 1 || c.fused_score < candidates[0].fused_score));
}

#[test]
fn search_response_carries_versioned_metadata() {
    let svc = CatalogService::new(Settings::default(), Arc::new(HashingEmbedder::new(64)), Arc::new(FlatIndexBuilder));
    let id = svc.reindex_documents(catalog()).expect("reindex");

    let response = svc.search(&SearchRequest::new("super app notes").with_top_k(5)).expect("search");
    assert_eq!(response.query, "super app notes");
    assert_eq!(response.total_results, response.results.len());
    assert_eq!(response.results[0].app_id, 1);
    assert!(response.results.iter().all(|r| (0.0..=1.0).contains(&r.relevance_score)));
    assert_eq!(response.metadata.version, METADATA_VERSION);
    assert_eq!(response.metadata.generation, id);
    assert_eq!(response.metadata.model, "hashing-xxh64:d64");
    assert!((response.metadata.keyword_weight - 0.4).abs() < 1e-6);

    let paid = svc.search(&SearchRequest::new("forecast radar").with_free_only(false)).expect("search");
    assert!(paid.results.iter().all(|r| r.app_id == 2));
}

#[test]
fn invalid_search_requests_are_rejected() {
    let svc = service();
    let (docs, embs) = triangle();
    svc.reindex(docs, embs).expect("reindex");
    for request in [
        SearchRequest::new("   "),
        SearchRequest::new("x".repeat(201)),
        SearchRequest::new("alpha").with_top_k(0),
        SearchRequest::new("alpha").with_top_k(51),
        SearchRequest::new("alpha").with_semantic_weight(1.5),
    ] {
        assert!(matches!(svc.search(&request), Err(Error::InvalidRequest(_))), "{request:?}");
    }
}

#[test]
fn personalized_and_similar_apps_use_the_serving_generation() {
    let svc = service();
    let (docs, embs) = triangle();
    svc.reindex(docs, embs).expect("reindex");

    let recs = svc.personalized_recommendations(&UserProfile::with_installed([1]), 2, Some(0.0)).expect("recs");
    assert_eq!(recs[0].app_id, 2);
    assert!(recs.iter().all(|r| r.app_id != 1));

    let similar = svc.similar_apps(1, 1).expect("similar");
    assert_eq!(similar[0].app_id, 2);
    assert!(svc.similar_apps(404, 3).expect("similar").is_empty());

    assert_eq!(svc.document(3).expect("doc").name, "Charlie");
    assert!(matches!(svc.document(404), Err(Error::NotFound(_))));
}

#[test]
fn empty_corpus_is_a_valid_generation() {
    let svc = service();
    svc.reindex(Vec::new(), Vec::new()).expect("reindex");

    assert!(svc.fuse_search("anything", 5, 0.5, None, None).expect("search").is_empty());
    let web = svc.recommendation_web(&RecommendationRequest::new([1], 2, 10)).expect("web");
    assert!(web.nodes.is_empty());
    assert!(svc.personalized_recommendations(&UserProfile::default(), 5, None).expect("recs").is_empty());

    let health = svc.health();
    assert!(health.initialized);
    assert_eq!(health.index_size, 0);
}

#[test]
fn failed_reindex_keeps_previous_generation() {
    let svc = service();
    let (docs, embs) = triangle();
    let first = svc.reindex(docs, embs).expect("reindex");

    let err = svc.reindex(vec![app(9, "Nine", 0)], vec![vec![1.0, 0.0]]).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
    let err = svc.reindex(vec![app(9, "Nine", 0)], Vec::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    assert_eq!(svc.snapshot().expect("snapshot").id, first);
    assert_eq!(svc.health().index_size, 3);
}

#[test]
fn held_snapshot_survives_reindex() {
    let svc = service();
    let (docs, embs) = triangle();
    svc.reindex(docs, embs).expect("reindex");
    let held = svc.snapshot().expect("snapshot");

    svc.reindex(vec![app(7, "Seven", 1)], vec![vec![0.0, 1.0, 0.0]]).expect("reindex");

    assert_eq!(held.len(), 3);
    assert_eq!(held.graph.edge_count(), 1);
    assert!(held.corpus.contains(1));
    let fresh = svc.snapshot().expect("snapshot");
    assert_eq!(fresh.len(), 1);
    assert!(fresh.id > held.id);
}

#[tokio::test]
async fn background_reindex_publishes_on_completion() {
    let svc = Arc::new(service());
    let (docs, embs) = triangle();

    let id = svc.spawn_reindex(docs, embs).await.expect("join").expect("reindex");
    let health = svc.health();
    assert!(health.initialized);
    assert_eq!(health.generation, Some(id));
    assert_eq!(health.index_size, 3);
    assert_eq!(health.graph_nodes, 3);
    assert_eq!(health.graph_edges, 1);
    assert!(health.built_at.is_some());

    let failed = svc.spawn_reindex(vec![app(5, "Five", 0)], vec![vec![1.0]]).await.expect("join");
    assert!(failed.is_err());
    assert_eq!(svc.health().generation, Some(id));
}

#[test]
fn health_serializes() {
    let svc = service();
    let json = serde_json::to_value(svc.health()).expect("json");
    assert_eq!(json["initialized"], false);
    assert!(json["version"].is_string());
}
