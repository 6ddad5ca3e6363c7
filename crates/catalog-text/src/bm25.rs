//! BM25 scoring over the catalog corpus.
//!
//! The index is immutable once built: IDF is computed over the fixed corpus
//! and a reindex builds a new `Bm25Index` from scratch.

use std::cmp::Ordering;
use std::collections::HashMap;

use catalog_core::config::Bm25Settings;
use catalog_core::traits::TextScorer;
use catalog_core::Document;
use tracing::debug;

use crate::tokenize::tokenize_with;

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    pub min_token_len: usize,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75, min_token_len: 3 } }
}

impl From<&Bm25Settings> for Bm25Params {
    fn from(s: &Bm25Settings) -> Self { Self { k1: s.k1, b: s.b, min_token_len: s.min_token_len } }
}

#[derive(Debug, Clone)]
struct Posting {
    doc: usize,
    tf: u32,
}

#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    doc_lens: Vec<u32>,
    avgdl: f32,
    postings: HashMap<String, Vec<Posting>>,
    idf: HashMap<String, f32>,
}

impl Bm25Index {
    /// Index catalog documents by their name, developer, description and category.
    pub fn from_documents(documents: &[Document], params: Bm25Params) -> Self {
        let texts: Vec<String> = documents.iter().map(Document::lexical_text).collect();
        Self::build(texts.iter().map(String::as_str), params)
    }

    pub fn build<'a, I>(texts: I, params: Bm25Params) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut doc_lens = Vec::new();
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for (doc, text) in texts.into_iter().enumerate() {
            let tokens = tokenize_with(text, params.min_token_len);
            doc_lens.push(tokens.len() as u32);
            let mut tf: HashMap<String, u32> = HashMap::new();
            for t in tokens { *tf.entry(t).or_insert(0) += 1; }
            for (term, count) in tf {
                postings.entry(term).or_default().push(Posting { doc, tf: count });
            }
        }

        let n = doc_lens.len() as f32;
        let total: u64 = doc_lens.iter().map(|&l| u64::from(l)).sum();
        let avgdl = if doc_lens.is_empty() { 0.0 } else { total as f32 / n };
        let idf = postings
            .iter()
            .map(|(term, list)| {
                let df = list.len() as f32;
                (term.clone(), (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        debug!(docs = doc_lens.len(), terms = postings.len(), avgdl, "built BM25 index");
        Self { params, doc_lens, avgdl, postings, idf }
    }

    pub fn len(&self) -> usize { self.doc_lens.len() }

    pub fn is_empty(&self) -> bool { self.doc_lens.is_empty() }

    /// BM25 score of `query` against every document, index-aligned with the corpus.
    pub fn score(&self, query: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lens.len()];
        if self.avgdl <= 0.0 { return scores; }
        let Bm25Params { k1, b, min_token_len } = self.params;
        for term in tokenize_with(query, min_token_len) {
            let (Some(list), Some(&idf)) = (self.postings.get(&term), self.idf.get(&term)) else { continue };
            for p in list {
                let tf = p.tf as f32;
                let dl = self.doc_lens[p.doc] as f32;
                let denom = tf + k1 * (1.0 - b + b * dl / self.avgdl);
                scores[p.doc] += idf * tf * (k1 + 1.0) / denom;
            }
        }
        scores
    }

    /// Best `k` documents with a positive score; ties go to the lower index.
    pub fn top_k(&self, query: &str, k: usize) -> Vec<(usize, f32)> {
        let mut hits: Vec<(usize, f32)> = self
            .score(query)
            .into_iter()
            .enumerate()
            .filter(|&(_, s)| s > 0.0)
            .collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        hits
    }
}

impl TextScorer for Bm25Index {
    fn top_k(&self, query: &str, k: usize) -> anyhow::Result<Vec<(usize, f32)>> {
        Ok(Bm25Index::top_k(self, query, k))
    }
}
