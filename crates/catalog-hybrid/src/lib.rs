//! catalog-hybrid
//!
//! Fuses semantic (vector) and lexical (BM25) relevance into one ranked,
//! filtered candidate list, plus the request/response shapes of a search.

pub mod fusion;
pub mod request;

pub use fusion::{fuse, normalize_by_max, FusionParams, HybridSearchEngine, SearchFilters};
pub use request::{SearchMetadata, SearchRequest, SearchResponse, SearchResult, METADATA_VERSION};
