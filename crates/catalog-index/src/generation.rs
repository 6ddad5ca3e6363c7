use catalog_core::config::Settings;
use catalog_core::traits::{VectorIndex, VectorIndexBuilder};
use catalog_core::{Corpus, Document, Error, Result, Signal};
use catalog_graph::{GraphParams, SimilarityGraph, SimilarityMatrix};
use catalog_text::{Bm25Index, Bm25Params};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// One complete, internally consistent snapshot of the corpus and every
/// index derived from it. Never mutated after construction.
pub struct IndexGeneration {
    pub id: u64,
    pub corpus: Corpus,
    pub lexical: Bm25Index,
    pub vector: Box<dyn VectorIndex>,
    pub similarity: SimilarityMatrix,
    pub graph: SimilarityGraph,
    pub built_at: DateTime<Utc>,
}

impl IndexGeneration {
    /// Build every index from `documents` and their index-aligned
    /// `embeddings`. `expected_dim` is the embedder's dimension; a corpus
    /// with vectors of another size could never be queried.
    #[instrument(skip_all, fields(id = id, docs = documents.len()))]
    pub fn build(
        id: u64,
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
        expected_dim: usize,
        settings: &Settings,
        index_builder: &dyn VectorIndexBuilder,
    ) -> Result<Self> {
        let corpus = Corpus::new(documents, embeddings)?;
        if !corpus.is_empty() && corpus.dim() != expected_dim {
            return Err(Error::invalid_request(format!(
                "embeddings have dimension {}, embedder produces {}",
                corpus.dim(),
                expected_dim
            )));
        }

        let lexical = Bm25Index::from_documents(corpus.documents(), Bm25Params::from(&settings.bm25));
        let vector = index_builder
            .build_index(corpus.embeddings())
            .map_err(|e| Error::signal(Signal::Semantic, &e))?;
        let similarity = SimilarityMatrix::compute(corpus.embeddings());
        let graph =
            SimilarityGraph::build_with_matrix(corpus.documents(), &similarity, &GraphParams::from(&settings.graph));

        info!(id, docs = corpus.len(), edges = graph.edge_count(), "index generation built");
        Ok(Self { id, corpus, lexical, vector, similarity, graph, built_at: Utc::now() })
    }

    pub fn len(&self) -> usize { self.corpus.len() }

    pub fn is_empty(&self) -> bool { self.corpus.is_empty() }
}

impl std::fmt::Debug for IndexGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexGeneration")
            .field("id", &self.id)
            .field("documents", &self.corpus.len())
            .field("graph_edges", &self.graph.edge_count())
            .field("built_at", &self.built_at)
            .finish_non_exhaustive()
    }
}
