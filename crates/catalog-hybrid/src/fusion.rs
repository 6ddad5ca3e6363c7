use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use catalog_core::traits::{Embedder, TextScorer, VectorIndex};
use catalog_core::{Document, Error, MatchType, Result, ScoredCandidate, Signal};
use tracing::{debug, instrument, warn};

/// Validated knobs for one fused search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    pub top_k: usize,
    pub semantic_weight: f32,
    pub min_similarity: f32,
    /// Each signal fetches `top_k * overfetch_factor` candidates.
    pub overfetch_factor: usize,
}

impl FusionParams {
    pub fn keyword_weight(&self) -> f32 { 1.0 - self.semantic_weight }
}

/// Strict-AND filters. An empty category string means no category filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub free_only: Option<bool>,
}

impl SearchFilters {
    fn accepts(&self, doc: &Document) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if doc.category.to_lowercase() != category.to_lowercase() { return false; }
        }
        if let Some(free) = self.free_only {
            if doc.is_free != free { return false; }
        }
        true
    }
}

pub struct HybridSearchEngine<'a> {
    documents: &'a [Document],
    text: &'a dyn TextScorer,
    vector: &'a dyn VectorIndex,
    embedder: &'a dyn Embedder,
}

impl<'a> HybridSearchEngine<'a> {
    pub fn new(
        documents: &'a [Document],
        text: &'a dyn TextScorer,
        vector: &'a dyn VectorIndex,
        embedder: &'a dyn Embedder,
    ) -> Self {
        Self { documents, text, vector, embedder }
    }

    /// Ranked candidates for `query`. Signal failures are logged and the
    /// search continues with whatever signal is still available.
    #[instrument(skip_all, fields(top_k = params.top_k, semantic_weight = params.semantic_weight))]
    pub fn search(&self, query: &str, params: &FusionParams, filters: &SearchFilters) -> Vec<ScoredCandidate> {
        let fetch = params.top_k.saturating_mul(params.overfetch_factor);

        let semantic = if params.semantic_weight > 0.0 {
            self.semantic_candidates(query, fetch).unwrap_or_else(|e| {
                warn!(error = %e, "semantic signal failed; continuing with lexical results");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let lexical = if params.keyword_weight() > 0.0 {
            self.lexical_candidates(query, fetch).unwrap_or_else(|e| {
                warn!(error = %e, "lexical signal failed; continuing with semantic results");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        debug!(semantic = semantic.len(), lexical = lexical.len(), "fetched candidates");
        fuse(self.documents, &semantic, &lexical, params, filters)
    }

    fn semantic_candidates(&self, query: &str, k: usize) -> Result<Vec<(usize, f32)>> {
        let q_vec = self.embedder.embed(query).map_err(|e| Error::signal(Signal::Semantic, &e))?;
        self.vector.search_vec(&q_vec, k).map_err(|e| Error::signal(Signal::Semantic, &e))
    }

    fn lexical_candidates(&self, query: &str, k: usize) -> Result<Vec<(usize, f32)>> {
        self.text.top_k(query, k).map_err(|e| Error::signal(Signal::Lexical, &e))
    }
}

/// Divide every score by the set's maximum; a non-positive maximum maps
/// the whole set to 0.
pub fn normalize_by_max(hits: &[(usize, f32)]) -> HashMap<usize, f32> {
    let max = hits.iter().map(|h| h.1).fold(f32::NEG_INFINITY, f32::max);
    hits.iter()
        .map(|&(idx, score)| (idx, if max > 0.0 { score / max } else { 0.0 }))
        .collect()
}

/// Combine two raw candidate sets into the final ranked list.
///
/// Out-of-range document indices coming from a signal are ignored.
pub fn fuse(
    documents: &[Document],
    semantic: &[(usize, f32)],
    lexical: &[(usize, f32)],
    params: &FusionParams,
    filters: &SearchFilters,
) -> Vec<ScoredCandidate> {
    let semantic = normalize_by_max(semantic);
    let lexical = normalize_by_max(lexical);
    let keyword_weight = params.keyword_weight();

    let union: BTreeSet<usize> = semantic.keys().chain(lexical.keys()).copied().collect();
    let mut fused: Vec<ScoredCandidate> = union
        .into_iter()
        .filter(|&idx| documents.get(idx).is_some_and(|doc| filters.accepts(doc)))
        .map(|idx| {
            let s = semantic.get(&idx).copied().unwrap_or(0.0);
            let l = lexical.get(&idx).copied().unwrap_or(0.0);
            ScoredCandidate {
                doc_index: idx,
                semantic_score: s,
                lexical_score: l,
                fused_score: (params.semantic_weight * s + keyword_weight * l).clamp(0.0, 1.0),
                match_type: MatchType::classify(s, l),
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| documents[a.doc_index].id.cmp(&documents[b.doc_index].id))
    });
    fused.truncate(params.top_k);
    fused.retain(|c| c.fused_score >= params.min_similarity);
    fused
}
