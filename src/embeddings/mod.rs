// Embedding capability consumed by the index build and the retriever

use crate::Result;
use crate::index::EmbeddingVector;

/// Converts text into fixed-length vectors.
///
/// Implementations must return vectors of the same dimensionality for every
/// call made with one model configuration.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>>;
}
