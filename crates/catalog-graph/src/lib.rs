//! catalog-graph
//!
//! Item-similarity structures built once per corpus generation and the
//! read-only algorithms that run over them:
//!
//! - `similarity`: dense pairwise cosine matrix over corpus embeddings
//! - `graph`: sparse top-neighbour similarity graph (arena + adjacency)
//! - `centrality`: weighted PageRank and degree centrality on induced subgraphs
//! - `expansion`: bounded multi-hop expansion from seed items with pruning
//! - `web`: visualization payload for the recommendation web
//! - `diversity`: MMR selection over relevance scores
//! - `recommend`: personalized recommendations and similar-item lookup

pub mod centrality;
pub mod diversity;
pub mod expansion;
pub mod graph;
pub mod recommend;
pub mod similarity;
pub mod web;

pub use diversity::DiversitySelector;
pub use expansion::{expand, Expansion, ExpansionParams};
pub use graph::{GraphNode, GraphParams, SimilarityGraph};
pub use recommend::{
    CollaborativeSignal, NoCollaborativeSignal, Recommendation, RecommendationReason, Recommender, RecommenderParams,
    SimilarApp,
};
pub use similarity::SimilarityMatrix;
pub use web::{recommendation_web, RecommendationWeb, WebLink, WebNode, WebStats};
