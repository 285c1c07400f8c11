
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use anyhow::{Context, anyhow};
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::chunking::ChunkingConfig;
use crate::composer::{AnswerComposer, system_directive};
use crate::config::Config;
use crate::document::{DocumentSource, FileSource};
use crate::embeddings::Embedder;
use crate::index::{FlatIndex, VectorIndex};
use crate::ollama::OllamaClient;
use crate::retriever::{Retriever, format_context};
use crate::{RagError, Result};

const DEFAULT_TOP_K: usize = 4;

/// Lifecycle of the lazily built index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
}

impl IndexState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Building => 1,
            Self::Ready => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Building,
            2 => Self::Ready,
            _ => Self::Uninitialized,
        }
    }
}

impl fmt::Display for IndexState {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Building => "building",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Answers questions about one document, building its index on first use.
///
/// Concurrent first requests share a single build; later requests reuse the
/// published index until [`Orchestrator::reset`] is called.
pub struct Orchestrator {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    composer: Arc<dyn AnswerComposer>,
    chunking: ChunkingConfig,
    top_k: usize,
    directive: String,
    index: OnceCell<Arc<FlatIndex>>,
    builds: AtomicUsize,
    state: AtomicU8,
}

impl Orchestrator {
    #[inline]
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn Embedder>,
        composer: Arc<dyn AnswerComposer>,
    ) -> Self {
        Self {
            source,
            embedder,
            composer,
            chunking: ChunkingConfig::default(),
            top_k: DEFAULT_TOP_K,
            directive: system_directive("the candidate"),
            index: OnceCell::new(),
            builds: AtomicUsize::new(0),
            state: AtomicU8::new(IndexState::Uninitialized.as_u8()),
        }
    }

    /// Wire the file-backed document and the Ollama client from configuration
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = Arc::new(
            OllamaClient::new(config)
                .map_err(|e| RagError::Configuration(format!("{:#}", e)))?,
        );
        let source = Arc::new(FileSource::new(config.document_path()));

        let embedder: Arc<dyn Embedder> = Arc::<OllamaClient>::clone(&client);
        Ok(Self::new(source, embedder, client)
            .with_chunking(config.chunking.clone())
            .with_top_k(config.retrieval.top_k)
            .with_subject(&config.answer.subject))
    }

    #[inline]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[inline]
    pub fn with_subject(mut self, subject: &str) -> Self {
        self.directive = system_directive(subject);
        self
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn state(&self) -> IndexState {
        IndexState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Number of index builds started so far
    #[inline]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Acquire)
    }

    /// Build the index if needed and return the shared handle
    #[inline]
    pub async fn index(&self) -> Result<Arc<FlatIndex>> {
        let index = self.index.get_or_try_init(|| self.build_index()).await?;
        Ok(Arc::clone(index))
    }

    /// Build eagerly, returning the number of indexed chunks
    #[inline]
    pub async fn warm_up(&self) -> Result<usize> {
        let index = self.index().await?;
        Ok(index.len())
    }

    /// Drop the published index so the next request rebuilds it
    #[inline]
    pub fn reset(&mut self) {
        if self.index.take().is_some() {
            info!("Index invalidated, next request will rebuild");
        }
        self.state
            .store(IndexState::Uninitialized.as_u8(), Ordering::Release);
    }

    #[inline]
    pub async fn retriever(&self) -> Result<Retriever> {
        let index = self.index().await?;
        Ok(Retriever::new(Arc::clone(&self.embedder), index))
    }

    /// Answer `question` from the most relevant chunks of the document
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let retriever = self.retriever().await?;
        let composer = Arc::clone(&self.composer);
        let directive = self.directive.clone();
        let question = question.to_string();
        let top_k = self.top_k;

        tokio::task::spawn_blocking(move || {
            let chunks = retriever.retrieve(&question, top_k)?;
            let context = format_context(&chunks);
            debug!(
                "Composing answer from {} chunks ({} context chars)",
                chunks.len(),
                context.len()
            );
            composer.complete(&directive, &context, &question)
        })
        .await
        .map_err(|e| RagError::Other(anyhow!("answer task failed: {}", e)))?
    }

    async fn build_index(&self) -> Result<Arc<FlatIndex>> {
        self.state
            .store(IndexState::Building.as_u8(), Ordering::Release);
        let build = self.builds.fetch_add(1, Ordering::AcqRel) + 1;
        info!("Building document index (build #{})", build);

        let source = Arc::clone(&self.source);
        let embedder = Arc::clone(&self.embedder);
        let chunking = self.chunking.clone();

        let result = tokio::task::spawn_blocking(move || {
            build_from_source(source.as_ref(), embedder.as_ref(), &chunking)
        })
        .await
        .context("index build task failed")
        .map_err(RagError::Other)
        .and_then(|built| built);

        match result {
            Ok(index) => {
                info!("Index ready with {} chunks", index.len());
                self.state.store(IndexState::Ready.as_u8(), Ordering::Release);
                Ok(Arc::new(index))
            }
            Err(e) => {
                error!("Index build failed: {}", e);
                self.state
                    .store(IndexState::Uninitialized.as_u8(), Ordering::Release);
                Err(e)
            }
        }
    }
}

/// Load, chunk, embed and index the document in one blocking pass
fn build_from_source(
    source: &dyn DocumentSource,
    embedder: &dyn Embedder,
    chunking: &ChunkingConfig,
) -> Result<FlatIndex> {
    let document = source.load()?;
    let chunks = chunking.split(&document.text, &document.source)?;
    debug!(
        "Split {} into {} chunks",
        document.source,
        chunks.len()
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts)?;

    let mut index = FlatIndex::new();
    index.build(chunks, embeddings)?;
    Ok(index)
}
