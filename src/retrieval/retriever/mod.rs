
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{ChunkMetadata, Corpus};
use crate::embeddings::EmbeddingProvider;
use crate::retrieval::index::VectorIndex;
use crate::{RagError, Result};

/// A chunk returned for a query, with its distance to the query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Embeds questions and looks up their nearest corpus chunks
pub struct Retriever {
    corpus: Corpus,
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Pair a corpus with the index built from its vectors.
    ///
    /// The index must hold exactly one vector per chunk, in corpus order.
    #[inline]
    pub fn new(
        corpus: Corpus,
        index: VectorIndex,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Result<Self> {
        if corpus.len() != index.len() {
            return Err(RagError::Internal(format!(
                "Index holds {} vectors for {} chunks",
                index.len(),
                corpus.len()
            )));
        }

        if index.dimension() != embedder.dimension() {
            return Err(RagError::Embedding(format!(
                "Index dimension {} does not match embedding model '{}' dimension {}",
                index.dimension(),
                embedder.model_id(),
                embedder.dimension()
            )));
        }

        Ok(Self {
            corpus,
            index,
            embedder,
            top_k,
        })
    }

    #[inline]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn embedding_model(&self) -> &str {
        self.embedder.model_id()
    }

    /// Top-k chunks for `question`, nearest first
    #[inline]
    pub fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            debug!("Index is empty, nothing to retrieve");
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .encode_one(question)
            .map_err(|e| RagError::Embedding(format!("Failed to embed question: {:#}", e)))?;

        let neighbors = self.index.search(&query, self.top_k)?;

        let results = neighbors
            .into_iter()
            .map(|neighbor| {
                let chunk = self.corpus.get(neighbor.index).ok_or_else(|| {
                    RagError::Internal(format!(
                        "Index returned position {} but the corpus has {} chunks",
                        neighbor.index,
                        self.corpus.len()
                    ))
                })?;
                Ok(RetrievedChunk {
                    text: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    distance: neighbor.distance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Retrieved {} chunks (nearest distance {:?})",
            results.len(),
            results.first().map(|r| r.distance)
        );

        Ok(results)
    }
}
