//! Personalized recommendations and similar-item lookup.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use catalog_core::config::RecommendSettings;
use catalog_core::types::round_to;
use catalog_core::{AppId, Corpus, Document, Error, Result, UserProfile};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::diversity::DiversitySelector;
use crate::similarity::SimilarityMatrix;

/// Per-item scores derived from other users' behaviour.
pub trait CollaborativeSignal: Send + Sync {
    fn scores(&self, profile: &UserProfile) -> anyhow::Result<HashMap<AppId, f32>>;
}

/// Contributes nothing; used until interaction data is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollaborativeSignal;

impl CollaborativeSignal for NoCollaborativeSignal {
    fn scores(&self, _profile: &UserProfile) -> anyhow::Result<HashMap<AppId, f32>> { Ok(HashMap::new()) }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommenderParams {
    pub content_weight: f32,
    pub collaborative_weight: f32,
    pub trending_weight: f32,
    pub candidate_pool_factor: usize,
    /// Similarity to an installed item above which it is named as the reason.
    pub reason_threshold: f32,
}

impl Default for RecommenderParams {
    fn default() -> Self { Self::from(&RecommendSettings::default()) }
}

impl From<&RecommendSettings> for RecommenderParams {
    fn from(s: &RecommendSettings) -> Self {
        Self {
            content_weight: s.content_weight,
            collaborative_weight: s.collaborative_weight,
            trending_weight: s.trending_weight,
            candidate_pool_factor: s.candidate_pool_factor,
            reason_threshold: s.reason_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationReason {
    SimilarTo { app_id: AppId, name: String },
    PopularInCategory { category: String },
}

impl fmt::Display for RecommendationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendationReason::SimilarTo { name, .. } => write!(f, "Similar to {name}"),
            RecommendationReason::PopularInCategory { category } => write!(f, "Popular in category {category}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub app_id: AppId,
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub downloads: u64,
    pub icon_url: String,
    pub is_free: bool,
    pub recommendation_score: f64,
    pub reason: RecommendationReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarApp {
    pub app_id: AppId,
    pub name: String,
    pub category: String,
    pub rating: f32,
    pub downloads: u64,
    pub icon_url: String,
    pub is_free: bool,
    pub similarity_score: f64,
}

impl SimilarApp {
    fn new(doc: &Document, similarity: f32) -> Self {
        Self {
            app_id: doc.id,
            name: doc.name.clone(),
            category: doc.category.clone(),
            rating: doc.rating,
            downloads: doc.downloads,
            icon_url: doc.icon_url.clone(),
            is_free: doc.is_free,
            similarity_score: round_to(f64::from(similarity), 4),
        }
    }
}

/// Read-only recommender over one corpus generation.
pub struct Recommender<'a> {
    corpus: &'a Corpus,
    similarity: &'a SimilarityMatrix,
    collaborative: &'a dyn CollaborativeSignal,
    params: RecommenderParams,
}

impl<'a> Recommender<'a> {
    pub fn new(
        corpus: &'a Corpus,
        similarity: &'a SimilarityMatrix,
        collaborative: &'a dyn CollaborativeSignal,
        params: RecommenderParams,
    ) -> Self {
        Self { corpus, similarity, collaborative, params }
    }

    /// Rank every item the user does not already own by a blend of content
    /// similarity, collaborative signal and popularity, then diversify.
    #[instrument(skip_all, fields(installed = profile.installed_ids.len(), top_k = top_k, diversity = diversity))]
    pub fn personalized(&self, profile: &UserProfile, top_k: usize, diversity: f32) -> Result<Vec<Recommendation>> {
        if top_k == 0 {
            return Err(Error::invalid_request("top_k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&diversity) {
            return Err(Error::invalid_request(format!("diversity must be within [0, 1], got {diversity}")));
        }
        if self.corpus.is_empty() {
            return Ok(Vec::new());
        }

        let installed: Vec<usize> =
            profile.installed_ids.iter().filter_map(|&id| self.corpus.position(id)).collect();
        let collaborative = self.collaborative.scores(profile).unwrap_or_else(|e| {
            warn!(error = %e, "collaborative signal unavailable; ignoring it");
            HashMap::new()
        });
        let max_downloads = self.corpus.documents().iter().map(|d| d.downloads).max().unwrap_or(0);

        let candidates: Vec<(usize, f32)> = self
            .corpus
            .documents()
            .iter()
            .enumerate()
            .filter(|(_, doc)| !profile.owns(doc.id))
            .map(|(idx, doc)| {
                let content = self.content_score(idx, &installed);
                let collab = collaborative.get(&doc.id).copied().unwrap_or(0.0);
                let trending = trending_score(doc, max_downloads);
                let score = self.params.content_weight * content
                    + self.params.collaborative_weight * collab
                    + self.params.trending_weight * trending;
                (idx, score)
            })
            .collect();
        debug!(candidates = candidates.len(), "scored recommendation candidates");

        let selected = DiversitySelector::new(self.similarity)
            .with_pool_factor(self.params.candidate_pool_factor)
            .select(&candidates, top_k, diversity);

        Ok(selected
            .into_iter()
            .map(|(idx, score)| {
                let doc = &self.corpus.documents()[idx];
                Recommendation {
                    app_id: doc.id,
                    name: doc.name.clone(),
                    category: doc.category.clone(),
                    rating: doc.rating,
                    downloads: doc.downloads,
                    icon_url: doc.icon_url.clone(),
                    is_free: doc.is_free,
                    recommendation_score: round_to(f64::from(score), 4),
                    reason: self.reason(idx, &installed),
                }
            })
            .collect())
    }

    /// The `top_k` items most similar to `app_id`, excluding itself.
    /// Unknown ids yield an empty list.
    pub fn similar_apps(&self, app_id: AppId, top_k: usize) -> Vec<SimilarApp> {
        let Some(idx) = self.corpus.position(app_id) else {
            return Vec::new();
        };
        let row = self.similarity.row(idx);
        let mut ranked: Vec<(usize, f32)> =
            row.iter().copied().enumerate().filter(|&(j, _)| j != idx).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(top_k)
            .map(|(j, s)| SimilarApp::new(&self.corpus.documents()[j], s))
            .collect()
    }

    /// Mean similarity to the installed items present in the corpus.
    fn content_score(&self, idx: usize, installed: &[usize]) -> f32 {
        if installed.is_empty() {
            return 0.0;
        }
        let total: f32 = installed.iter().map(|&i| self.similarity.get(idx, i)).sum();
        total / installed.len() as f32
    }

    fn reason(&self, idx: usize, installed: &[usize]) -> RecommendationReason {
        let mut best: Option<(usize, f32)> = None;
        for &i in installed {
            let sim = self.similarity.get(idx, i);
            match best {
                Some((_, s)) if sim <= s => {}
                _ => best = Some((i, sim)),
            }
        }
        match best {
            Some((i, sim)) if sim > self.params.reason_threshold => {
                let doc = &self.corpus.documents()[i];
                RecommendationReason::SimilarTo { app_id: doc.id, name: doc.name.clone() }
            }
            _ => RecommendationReason::PopularInCategory { category: self.corpus.documents()[idx].category.clone() },
        }
    }
}

/// Popularity blend of normalized downloads and rating.
fn trending_score(doc: &Document, max_downloads: u64) -> f32 {
    let downloads = if max_downloads == 0 { 0.0 } else { doc.downloads as f32 / max_downloads as f32 };
    0.7 * downloads + 0.3 * (doc.rating / 5.0)
}
