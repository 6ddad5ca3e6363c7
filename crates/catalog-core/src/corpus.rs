use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{AppId, Document};

/// Documents plus their embeddings, index-aligned.
///
/// Index `i` refers to the same document in both `documents()` and
/// `embeddings()`. Built once per reindex and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
    positions: HashMap<AppId, usize>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if documents.len() != embeddings.len() {
            return Err(Error::invalid_request(format!(
                "corpus has {} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }
        if let Some(first) = embeddings.first() {
            let dim = first.len();
            if let Some(pos) = embeddings.iter().position(|e| e.len() != dim) {
                return Err(Error::invalid_request(format!(
                    "embedding {} has dimension {}, expected {}",
                    pos,
                    embeddings[pos].len(),
                    dim
                )));
            }
        }
        let mut positions = HashMap::with_capacity(documents.len());
        for (idx, doc) in documents.iter().enumerate() {
            if positions.insert(doc.id, idx).is_some() {
                return Err(Error::invalid_request(format!("duplicate document id {}", doc.id)));
            }
        }
        Ok(Self { documents, embeddings, positions })
    }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn embeddings(&self) -> &[Vec<f32>] { &self.embeddings }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn position(&self, id: AppId) -> Option<usize> { self.positions.get(&id).copied() }

    pub fn get(&self, id: AppId) -> Option<&Document> { self.position(id).map(|i| &self.documents[i]) }

    pub fn contains(&self, id: AppId) -> bool { self.positions.contains_key(&id) }

    /// Embedding dimensionality, or 0 for an empty corpus.
    pub fn dim(&self) -> usize { self.embeddings.first().map_or(0, Vec::len) }
}
