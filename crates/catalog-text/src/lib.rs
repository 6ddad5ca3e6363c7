//! catalog-text
//!
//! Lexical relevance for catalog search: a fixed tokenizer and an in-memory
//! BM25 index built once per corpus generation.

pub mod bm25;
pub mod tokenize;

pub use bm25::{Bm25Index, Bm25Params};
pub use tokenize::tokenize;
