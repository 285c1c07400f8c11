
use tracing::debug;

use crate::chunking::Chunk;
use crate::{RagError, Result};

pub type EmbeddingVector = Vec<f32>;

/// A chunk paired with its similarity to a query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity_score: f64,
}

/// Stores chunk embeddings and answers top-K similarity queries
pub trait VectorIndex {
    /// Append one record per `(chunk, embedding)` pair, in input order
    fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<EmbeddingVector>) -> Result<()>;

    /// Return the `min(k, len)` records most similar to `query`, best first
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality established by the first build, if any
    fn dimension(&self) -> Option<usize>;

    /// Drop every record and forget the established dimensionality
    fn clear(&mut self);
}

#[derive(Debug, Clone)]
struct IndexRecord {
    chunk: Chunk,
    embedding: EmbeddingVector,
    norm: f64,
}

/// Exact brute-force cosine similarity index
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    records: Vec<IndexRecord>,
    dimension: Option<usize>,
}

impl FlatIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.records.iter().map(|r| &r.chunk)
    }
}

impl VectorIndex for FlatIndex {
    #[inline]
    fn build(&mut self, chunks: Vec<Chunk>, embeddings: Vec<EmbeddingVector>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::LengthMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        // Validate the whole batch before appending anything
        let mut expected = self.dimension;
        for embedding in &embeddings {
            if embedding.is_empty() {
                return Err(RagError::InvalidInput(
                    "embedding vectors must not be empty".to_string(),
                ));
            }
            match expected {
                Some(dimension) if dimension != embedding.len() => {
                    return Err(RagError::DimensionMismatch {
                        expected: dimension,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => expected = Some(embedding.len()),
            }
        }

        let added = chunks.len();
        self.records.reserve(added);
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            let norm = magnitude(&embedding);
            self.records.push(IndexRecord {
                chunk,
                embedding,
                norm,
            });
        }
        self.dimension = expected;

        debug!(
            "Indexed {} records ({} total, dimension {:?})",
            added,
            self.records.len(),
            self.dimension
        );
        Ok(())
    }

    #[inline]
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }
        let Some(dimension) = self.dimension.filter(|_| !self.records.is_empty()) else {
            return Err(RagError::EmptyIndex);
        };
        if query.len() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let query_norm = magnitude(query);
        let mut scored: Vec<(&IndexRecord, f64)> = self
            .records
            .iter()
            .map(|record| {
                let score = cosine_similarity(query, query_norm, &record.embedding, record.norm);
                (record, score)
            })
            .collect();

        scored.sort_by(|(a, a_score), (b, b_score)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| a.chunk.sequence_order.cmp(&b.chunk.sequence_order))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(record, similarity_score)| ScoredChunk {
                chunk: record.chunk.clone(),
                similarity_score,
            })
            .collect())
    }

    #[inline]
    fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    #[inline]
    fn clear(&mut self) {
        self.records.clear();
        self.dimension = None;
    }
}

/// Cosine similarity of two vectors given their norms.
///
/// A zero-magnitude vector has no direction, so it scores 0.0 against everything.
#[inline]
pub fn cosine_similarity(a: &[f32], a_norm: f64, b: &[f32], b_norm: f64) -> f64 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }

    let dot = a
        .iter()
        .zip(b)
        .fold(0.0_f64, |acc, (&x, &y)| f64::from(x).mul_add(f64::from(y), acc));
    let similarity = dot / (a_norm * b_norm);

    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Euclidean norm of a vector
#[inline]
pub fn magnitude(v: &[f32]) -> f64 {
    v.iter()
        .fold(0.0_f64, |acc, &x| f64::from(x).mul_add(f64::from(x), acc))
        .sqrt()
}
