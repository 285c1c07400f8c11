use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {chunks} chunks but {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },

    #[error("Index is empty")]
    EmptyIndex,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Short machine-stable reason string reported at the request boundary
    #[inline]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::EmptyIndex => "empty_index",
            Self::Upstream(_) => "upstream_failure",
            Self::Configuration(_) => "configuration_error",
            Self::Io(_) => "io_error",
            Self::Other(_) => "internal_error",
        }
    }

    /// HTTP-style status code for the request boundary
    #[inline]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::EmptyIndex => 503,
            Self::Upstream(_) => 502,
            Self::DimensionMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::Configuration(_)
            | Self::Io(_)
            | Self::Other(_) => 500,
        }
    }
}

pub mod chunking;
pub mod commands;
pub mod composer;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod ollama;
pub mod orchestrator;
pub mod retriever;
pub mod server;
