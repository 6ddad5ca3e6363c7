//! Domain types shared by the lexical, vector, fusion and graph engines.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Catalog-wide application identifier.
pub type AppId = i64;

/// An immutable catalog record (one mobile application).
///
/// Deserializes from the backend's camelCase payload (`shortDescription`,
/// `isFree`, `iconUrl`, ...) as well as from snake_case keys. Text fields
/// that are missing or `null` become empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: AppId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "package_name", deserialize_with = "null_as_default")]
    pub package_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub developer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, alias = "short_description", deserialize_with = "null_as_default")]
    pub short_description: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default = "default_is_free", alias = "is_free")]
    pub is_free: bool,
    #[serde(default, alias = "icon_url", deserialize_with = "null_as_default")]
    pub icon_url: String,
    #[serde(default = "default_age_rating", alias = "age_rating")]
    pub age_rating: String,
}

fn default_is_free() -> bool { true }

fn default_age_rating() -> String { "0+".to_string() }

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Minimal constructor; remaining fields take their catalog defaults.
    pub fn new(id: AppId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            package_name: String::new(),
            developer: String::new(),
            category: String::new(),
            description: String::new(),
            short_description: String::new(),
            rating: 0.0,
            downloads: 0,
            is_free: true,
            icon_url: String::new(),
            age_rating: default_age_rating(),
        }
    }

    /// Text fed to the lexical scorer.
    pub fn lexical_text(&self) -> String {
        format!("{} {} {} {}", self.name, self.developer, self.description, self.category)
    }

    /// Text fed to the embedding provider.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}. {}", self.name, self.developer, self.description)
    }
}

/// Which signal(s) contributed to a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Semantic,
    Keyword,
    Hybrid,
}

impl MatchType {
    /// Classify from the two normalized component scores.
    pub fn classify(semantic: f32, lexical: f32) -> Self {
        match (semantic > 0.0, lexical > 0.0) {
            (true, true) => MatchType::Hybrid,
            (true, false) => MatchType::Semantic,
            _ => MatchType::Keyword,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Semantic => "semantic",
            MatchType::Keyword => "keyword",
            MatchType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Per-query fused candidate. `doc_index` points into the active corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub doc_index: usize,
    pub semantic_score: f32,
    pub lexical_score: f32,
    pub fused_score: f32,
    pub match_type: MatchType,
}

/// Seed set and budget for a recommendation-web request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(alias = "installed_app_ids")]
    pub installed_ids: BTreeSet<AppId>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,
}

fn default_max_depth() -> usize { 2 }

fn default_max_recommendations() -> usize { 20 }

impl RecommendationRequest {
    pub fn new(installed_ids: impl IntoIterator<Item = AppId>, max_depth: usize, max_recommendations: usize) -> Self {
        Self { installed_ids: installed_ids.into_iter().collect(), max_depth, max_recommendations }
    }
}

/// What we know about a user when building personalized recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub installed_ids: BTreeSet<AppId>,
    #[serde(default)]
    pub wishlist_ids: BTreeSet<AppId>,
    #[serde(default)]
    pub interaction_scores: HashMap<AppId, f32>,
}

impl UserProfile {
    pub fn with_installed(installed: impl IntoIterator<Item = AppId>) -> Self {
        Self { installed_ids: installed.into_iter().collect(), ..Self::default() }
    }

    /// Installed or wishlisted items are never recommended back.
    pub fn owns(&self, id: AppId) -> bool {
        self.installed_ids.contains(&id) || self.wishlist_ids.contains(&id)
    }
}

/// Round to a fixed number of decimal places for presentation.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
