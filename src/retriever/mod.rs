
use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::Result;
use crate::chunking::Chunk;
use crate::embeddings::Embedder;
use crate::index::{FlatIndex, ScoredChunk, VectorIndex};

/// Embeds a question and looks up the most similar chunks
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<FlatIndex>,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<FlatIndex>) -> Self {
        Self { embedder, index }
    }

    /// Top `k` chunks for `question`, most relevant first
    #[inline]
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(question, k)?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }

    #[inline]
    pub fn retrieve_scored(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query = self.embedder.embed(question)?;
        let results = self.index.search(&query, k)?;

        debug!(
            "Retrieved {} of {} chunks (best score {:?})",
            results.len(),
            self.index.len(),
            results.first().map(|r| r.similarity_score)
        );
        Ok(results)
    }
}

/// Concatenate chunk texts into the context block, separated by blank lines
#[inline]
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks.iter().map(|chunk| chunk.text.as_str()).join("\n\n")
}
