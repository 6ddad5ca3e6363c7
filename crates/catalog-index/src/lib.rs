//! catalog-index
//!
//! Index generations and the service facade the surrounding layer talks to:
//! search, recommendation web, personalized recommendations, similar apps
//! and reindexing with an atomic publish.

pub mod generation;
pub mod service;

pub use generation::IndexGeneration;
pub use service::{CatalogService, Health};
