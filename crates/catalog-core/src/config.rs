//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Nested keys are addressed from the environment with a double underscore,
//! e.g. `APP_SEARCH__TOP_K=10`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load with `dir` as the location of the TOML files.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed, validated view of the ranking settings.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub bm25: Bm25Settings,
    pub graph: GraphSettings,
    pub recommend: RecommendSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub semantic_weight: f32,
    pub top_k: usize,
    pub max_top_k: usize,
    /// Fused scores below this are dropped after truncation.
    pub min_similarity: f32,
    pub max_query_len: usize,
    pub overfetch_factor: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            semantic_weight: 0.6,
            top_k: 20,
            max_top_k: 50,
            min_similarity: 0.3,
            max_query_len: 200,
            overfetch_factor: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Settings {
    pub k1: f32,
    pub b: f32,
    pub min_token_len: usize,
}

impl Default for Bm25Settings {
    fn default() -> Self { Self { k1: 1.5, b: 0.75, min_token_len: 3 } }
}

/// How depth >= 2 expansion candidates are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalScoring {
    /// Edge weight to the seed the expansion started from; candidates with
    /// no direct edge to that seed are skipped.
    #[default]
    SeedEdge,
    /// Strongest edge to any node already included.
    ParentEdge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub neighbors_per_node: usize,
    pub edge_threshold: f32,
    pub expansion_fanout: usize,
    pub max_depth_limit: usize,
    pub pagerank_damping: f64,
    pub pagerank_max_iter: usize,
    pub pagerank_tolerance: f64,
    pub traversal: TraversalScoring,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            neighbors_per_node: 5,
            edge_threshold: 0.5,
            expansion_fanout: 5,
            max_depth_limit: 5,
            pagerank_damping: 0.85,
            pagerank_max_iter: 100,
            pagerank_tolerance: 1e-6,
            traversal: TraversalScoring::SeedEdge,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    pub content_weight: f32,
    pub collaborative_weight: f32,
    pub trending_weight: f32,
    pub candidate_pool_factor: usize,
    pub reason_threshold: f32,
    pub default_diversity: f32,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            content_weight: 0.5,
            collaborative_weight: 0.3,
            trending_weight: 0.2,
            candidate_pool_factor: 3,
            reason_threshold: 0.7,
            default_diversity: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dim: usize,
    pub model: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { dim: 384, model: "hashing-xxh64".to_string() } }
}

fn unit_interval(name: &str, v: f32) -> Result<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) { Ok(()) }
    else { Err(Error::InvalidConfig(format!("{name} must be within [0, 1], got {v}"))) }
}

fn positive(name: &str, v: usize) -> Result<()> {
    if v > 0 { Ok(()) } else { Err(Error::InvalidConfig(format!("{name} must be positive"))) }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let s = &self.search;
        unit_interval("search.semantic_weight", s.semantic_weight)?;
        positive("search.top_k", s.top_k)?;
        positive("search.max_top_k", s.max_top_k)?;
        if s.top_k > s.max_top_k {
            return Err(Error::InvalidConfig(format!("search.top_k {} exceeds search.max_top_k {}", s.top_k, s.max_top_k)));
        }
        if !s.min_similarity.is_finite() {
            return Err(Error::InvalidConfig("search.min_similarity must be finite".into()));
        }
        positive("search.max_query_len", s.max_query_len)?;
        positive("search.overfetch_factor", s.overfetch_factor)?;

        if !(self.bm25.k1.is_finite() && self.bm25.k1 >= 0.0) {
            return Err(Error::InvalidConfig(format!("bm25.k1 must be non-negative, got {}", self.bm25.k1)));
        }
        unit_interval("bm25.b", self.bm25.b)?;

        let g = &self.graph;
        if !(g.edge_threshold.is_finite() && (-1.0..=1.0).contains(&g.edge_threshold)) {
            return Err(Error::InvalidConfig(format!("graph.edge_threshold must be within [-1, 1], got {}", g.edge_threshold)));
        }
        positive("graph.max_depth_limit", g.max_depth_limit)?;
        if !(g.pagerank_damping > 0.0 && g.pagerank_damping < 1.0) {
            return Err(Error::InvalidConfig(format!("graph.pagerank_damping must be within (0, 1), got {}", g.pagerank_damping)));
        }
        positive("graph.pagerank_max_iter", g.pagerank_max_iter)?;

        let r = &self.recommend;
        unit_interval("recommend.content_weight", r.content_weight)?;
        unit_interval("recommend.collaborative_weight", r.collaborative_weight)?;
        unit_interval("recommend.trending_weight", r.trending_weight)?;
        unit_interval("recommend.default_diversity", r.default_diversity)?;
        positive("recommend.candidate_pool_factor", r.candidate_pool_factor)?;

        positive("embedding.dim", self.embedding.dim)?;
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
