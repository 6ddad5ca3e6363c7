//! catalog-core
//!
//! Shared domain types, the error taxonomy, the traits behind which the
//! embedding provider and vector index live, and configuration loading.

pub mod config;
pub mod corpus;
pub mod error;
pub mod math;
pub mod traits;
pub mod types;

pub use corpus::Corpus;
pub use error::{Error, Result, Signal};
pub use types::{AppId, Document, MatchType, RecommendationRequest, ScoredCandidate, UserProfile};
