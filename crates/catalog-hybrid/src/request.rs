//! Search request and response shapes handed to the service layer.

use catalog_core::config::SearchSettings;
use catalog_core::types::round_to;
use catalog_core::{AppId, Document, Error, MatchType, Result, ScoredCandidate};
use serde::{Deserialize, Serialize};

use crate::fusion::{FusionParams, SearchFilters};

pub const METADATA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub semantic_weight: Option<f32>,
    #[serde(default)]
    pub category_filter: Option<String>,
    #[serde(default)]
    pub free_only: Option<bool>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), top_k: None, semantic_weight: None, category_filter: None, free_only: None }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self { self.top_k = Some(top_k); self }

    pub fn with_semantic_weight(mut self, weight: f32) -> Self { self.semantic_weight = Some(weight); self }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category_filter = Some(category.into()); self }

    pub fn with_free_only(mut self, free_only: bool) -> Self { self.free_only = Some(free_only); self }

    /// Reject out-of-range input before any scoring happens.
    pub fn validate(&self, settings: &SearchSettings) -> Result<(FusionParams, SearchFilters)> {
        let len = self.query.trim().chars().count();
        if len == 0 {
            return Err(Error::invalid_request("query must not be empty"));
        }
        if self.query.chars().count() > settings.max_query_len {
            return Err(Error::invalid_request(format!("query exceeds {} characters", settings.max_query_len)));
        }
        let top_k = self.top_k.unwrap_or(settings.top_k);
        if top_k == 0 || top_k > settings.max_top_k {
            return Err(Error::invalid_request(format!("top_k must be within 1..={}, got {}", settings.max_top_k, top_k)));
        }
        let semantic_weight = self.semantic_weight.unwrap_or(settings.semantic_weight);
        if !(semantic_weight.is_finite() && (0.0..=1.0).contains(&semantic_weight)) {
            return Err(Error::invalid_request(format!("semantic_weight must be within [0, 1], got {semantic_weight}")));
        }
        let params = FusionParams {
            top_k,
            semantic_weight,
            min_similarity: settings.min_similarity,
            overfetch_factor: settings.overfetch_factor,
        };
        let filters = SearchFilters { category: self.category_filter.clone(), free_only: self.free_only };
        Ok((params, filters))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub app_id: AppId,
    pub name: String,
    pub developer: String,
    pub category: String,
    pub short_description: String,
    pub rating: f32,
    pub downloads: u64,
    pub icon_url: String,
    pub relevance_score: f64,
    pub match_type: MatchType,
}

impl SearchResult {
    pub fn from_candidate(doc: &Document, candidate: &ScoredCandidate) -> Self {
        Self {
            app_id: doc.id,
            name: doc.name.clone(),
            developer: doc.developer.clone(),
            category: doc.category.clone(),
            short_description: doc.short_description.clone(),
            rating: doc.rating,
            downloads: doc.downloads,
            icon_url: doc.icon_url.clone(),
            relevance_score: round_to(f64::from(candidate.fused_score), 4),
            match_type: candidate.match_type,
        }
    }
}

/// Fixed, versioned replacement for free-form response metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub version: u32,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    pub model: String,
    /// Index generation that served the request.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub search_time_ms: f64,
    pub metadata: SearchMetadata,
}
