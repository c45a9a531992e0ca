use std::sync::Arc;

use autostream_core::domain::document::Document;
use tracing::info;

use crate::embedding::{Embedder, EmbeddingError};

/// Exhaustive squared-L2 search over a fixed set of vectors.
#[derive(Clone, Debug, Default)]
pub struct FlatL2Index {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatL2Index {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, vectors: Vec::new() }
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<(), EmbeddingError> {
        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Up to `k` `(position, distance)` pairs, nearest first; ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, EmbeddingError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(vector, query)))
            .collect::<Vec<_>>();
        scored.sort_by(|left, right| left.1.total_cmp(&right.1).then(left.0.cmp(&right.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(left: &[f32], right: &[f32]) -> f32 {
    left.iter().zip(right).map(|(a, b)| (a - b) * (a - b)).sum()
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedDocument {
    pub title: String,
    pub content: String,
    pub distance: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RetrievedContext {
    pub documents: Vec<RetrievedDocument>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.documents.iter().map(|document| document.title.clone()).collect()
    }

    /// `[Source: title]` blocks separated by blank lines; empty when nothing matched.
    pub fn as_prompt_text(&self) -> String {
        self.documents
            .iter()
            .map(|hit| format!("[Source: {}]\n{}", hit.title, hit.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Static corpus embedded once; only queries are embedded afterwards.
pub struct Retriever {
    documents: Vec<Document>,
    index: FlatL2Index,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    pub async fn build(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self, EmbeddingError> {
        let texts = documents.iter().map(|document| document.content.clone()).collect::<Vec<_>>();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: documents.len(),
                actual: vectors.len(),
            });
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        let mut index = FlatL2Index::new(dimensions);
        for vector in vectors {
            index.add(vector)?;
        }

        info!(
            event_name = "retrieval.index.built",
            embedder = embedder.name(),
            documents = index.len(),
            dimensions,
            "knowledge base indexed"
        );

        Ok(Self { documents, index, embedder, top_k })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext, EmbeddingError> {
        self.retrieve_top(query, self.top_k).await
    }

    pub async fn retrieve_top(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievedContext, EmbeddingError> {
        if self.index.is_empty() || top_k == 0 {
            return Ok(RetrievedContext::default());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch { expected: 1, actual: 0 })?;

        let documents = self
            .index
            .search(&query_vector, top_k)?
            .into_iter()
            .filter_map(|(position, distance)| {
                self.documents.get(position).map(|document| RetrievedDocument {
                    title: document.title.clone(),
                    content: document.content.clone(),
                    distance,
                })
            })
            .collect();

        Ok(RetrievedContext { documents })
    }
}
