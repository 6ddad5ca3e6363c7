use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use catalog_core::config::Settings;
use catalog_core::traits::{Embedder, VectorIndexBuilder};
use catalog_core::types::round_to;
use catalog_core::{
    AppId, Document, Error, RecommendationRequest, Result, ScoredCandidate, Signal, UserProfile,
};
use catalog_embed::get_default_embedder;
use catalog_graph::{
    CollaborativeSignal, ExpansionParams, GraphParams, NoCollaborativeSignal, Recommendation, RecommendationWeb,
    Recommender, RecommenderParams, SimilarApp, SimilarityGraph,
};
use catalog_hybrid::{HybridSearchEngine, SearchMetadata, SearchRequest, SearchResponse, SearchResult, METADATA_VERSION};
use catalog_vector::FlatIndexBuilder;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::generation::IndexGeneration;

/// Liveness and size of the serving generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub initialized: bool,
    pub generation: Option<u64>,
    pub index_size: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub built_at: Option<DateTime<Utc>>,
    pub version: String,
}

/// Facade over the active index generation.
///
/// Readers clone the current `Arc<IndexGeneration>` and work on it without
/// further locking; a reindex builds a whole new generation off to the side
/// and swaps the pointer in one write. A generation is dropped once its
/// last reader lets go.
pub struct CatalogService {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    index_builder: Arc<dyn VectorIndexBuilder>,
    collaborative: Arc<dyn CollaborativeSignal>,
    current: RwLock<Option<Arc<IndexGeneration>>>,
    next_id: AtomicU64,
}

impl CatalogService {
    pub fn new(settings: Settings, embedder: Arc<dyn Embedder>, index_builder: Arc<dyn VectorIndexBuilder>) -> Self {
        Self {
            settings,
            embedder,
            index_builder,
            collaborative: Arc::new(NoCollaborativeSignal),
            current: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Service wired with the configured embedder and the flat index.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let embedder: Arc<dyn Embedder> = Arc::from(
            get_default_embedder(&settings.embedding).map_err(|e| Error::InvalidConfig(format!("{e:#}")))?,
        );
        Ok(Self::new(settings, embedder, Arc::new(FlatIndexBuilder)))
    }

    pub fn with_collaborative(mut self, signal: Arc<dyn CollaborativeSignal>) -> Self {
        self.collaborative = signal;
        self
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn embedder(&self) -> &dyn Embedder { self.embedder.as_ref() }

    /// The generation currently serving reads.
    pub fn snapshot(&self) -> Result<Arc<IndexGeneration>> {
        self.current.read().clone().ok_or(Error::NotInitialized)
    }

    /// Build a new generation and publish it. Returns the generation id.
    ///
    /// On failure the previous generation keeps serving.
    #[instrument(skip_all, fields(docs = documents.len()))]
    pub fn reindex(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let generation = IndexGeneration::build(
            id,
            documents,
            embeddings,
            self.embedder.dim(),
            &self.settings,
            self.index_builder.as_ref(),
        )?;
        self.publish(generation);
        Ok(id)
    }

    /// Embed `documents` with the service's embedder, then reindex.
    pub fn reindex_documents(&self, documents: Vec<Document>) -> Result<u64> {
        let texts: Vec<String> = documents.iter().map(Document::embedding_text).collect();
        let embeddings = self.embedder.embed_batch(&texts).map_err(|e| Error::signal(Signal::Semantic, &e))?;
        self.reindex(documents, embeddings)
    }

    /// Run `reindex` on the blocking pool. Readers keep using the current
    /// generation until the new one is published.
    pub fn spawn_reindex(self: &Arc<Self>, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> JoinHandle<Result<u64>> {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let result = service.reindex(documents, embeddings);
            if let Err(e) = &result {
                error!(error = %e, "background reindex failed; keeping previous generation");
            }
            result
        })
    }

    /// Swap in `generation` unless a newer one is already serving.
    fn publish(&self, generation: IndexGeneration) {
        let id = generation.id;
        let mut current = self.current.write();
        if let Some(existing) = current.as_ref().filter(|g| g.id > id) {
            warn!(id, serving = existing.id, "discarding stale generation");
            return;
        }
        *current = Some(Arc::new(generation));
        drop(current);
        info!(id, "published index generation");
    }

    /// Ranked candidates for a query against the serving generation.
    pub fn fuse_search(
        &self,
        query: &str,
        top_k: usize,
        semantic_weight: f32,
        category_filter: Option<&str>,
        free_only: Option<bool>,
    ) -> Result<Vec<ScoredCandidate>> {
        let generation = self.snapshot()?;
        let mut request = SearchRequest::new(query).with_top_k(top_k).with_semantic_weight(semantic_weight);
        request.category_filter = category_filter.map(str::to_string);
        request.free_only = free_only;
        let (params, filters) = request.validate(&self.settings.search)?;
        Ok(self.engine(&generation).search(&request.query, &params, &filters))
    }

    /// Full search round: validate, fuse, project documents, attach metadata.
    #[instrument(skip_all, fields(query = %request.query))]
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let generation = self.snapshot()?;
        let (params, filters) = request.validate(&self.settings.search)?;
        let started = Instant::now();

        let candidates = self.engine(&generation).search(&request.query, &params, &filters);
        let documents = generation.corpus.documents();
        let results: Vec<SearchResult> =
            candidates.iter().map(|c| SearchResult::from_candidate(&documents[c.doc_index], c)).collect();

        let search_time_ms = round_to(started.elapsed().as_secs_f64() * 1000.0, 2);
        debug!(results = results.len(), search_time_ms, "search complete");
        Ok(SearchResponse {
            query: request.query.clone(),
            total_results: results.len(),
            results,
            search_time_ms,
            metadata: SearchMetadata {
                version: METADATA_VERSION,
                semantic_weight: params.semantic_weight,
                keyword_weight: params.keyword_weight(),
                model: self.embedder.model_id().to_string(),
                generation: generation.id,
            },
        })
    }

    fn engine<'g>(&'g self, generation: &'g IndexGeneration) -> HybridSearchEngine<'g> {
        HybridSearchEngine::new(
            generation.corpus.documents(),
            &generation.lexical,
            generation.vector.as_ref(),
            self.embedder.as_ref(),
        )
    }

    /// Standalone graph over `documents`, using the configured parameters.
    pub fn build_graph(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> SimilarityGraph {
        SimilarityGraph::build(documents, embeddings, &GraphParams::from(&self.settings.graph))
    }

    pub fn recommendation_web(&self, request: &RecommendationRequest) -> Result<RecommendationWeb> {
        let generation = self.snapshot()?;
        catalog_graph::recommendation_web(&generation.graph, request, &ExpansionParams::from(&self.settings.graph))
    }

    /// `diversity` falls back to the configured default when `None`.
    pub fn personalized_recommendations(
        &self,
        profile: &UserProfile,
        top_k: usize,
        diversity: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        let generation = self.snapshot()?;
        let diversity = diversity.unwrap_or(self.settings.recommend.default_diversity);
        self.recommender(&generation).personalized(profile, top_k, diversity)
    }

    pub fn similar_apps(&self, app_id: AppId, top_k: usize) -> Result<Vec<SimilarApp>> {
        let generation = self.snapshot()?;
        Ok(self.recommender(&generation).similar_apps(app_id, top_k))
    }

    fn recommender<'g>(&'g self, generation: &'g IndexGeneration) -> Recommender<'g> {
        Recommender::new(
            &generation.corpus,
            &generation.similarity,
            self.collaborative.as_ref(),
            RecommenderParams::from(&self.settings.recommend),
        )
    }

    pub fn document(&self, app_id: AppId) -> Result<Document> {
        let generation = self.snapshot()?;
        generation.corpus.get(app_id).cloned().ok_or_else(|| Error::NotFound(format!("app {app_id}")))
    }

    pub fn health(&self) -> Health {
        let current = self.current.read().clone();
        Health {
            initialized: current.is_some(),
            generation: current.as_ref().map(|g| g.id),
            index_size: current.as_ref().map_or(0, |g| g.len()),
            graph_nodes: current.as_ref().map_or(0, |g| g.graph.node_count()),
            graph_edges: current.as_ref().map_or(0, |g| g.graph.edge_count()),
            built_at: current.as_ref().map(|g| g.built_at),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
