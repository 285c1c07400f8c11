
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{RagError, Result};

/// The single corpus document answered against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier recorded in every chunk's metadata
    pub source: String,
    pub text: String,
}

/// Supplies the corpus document at index build time
pub trait DocumentSource: Send + Sync {
    fn load(&self) -> Result<Document>;
}

/// Reads the document from a UTF-8 text file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    #[inline]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileSource {
    #[inline]
    fn load(&self) -> Result<Document> {
        if self.path.as_os_str().is_empty() {
            return Err(RagError::Configuration(
                "no document path configured".to_string(),
            ));
        }
        if !self.path.is_file() {
            return Err(RagError::Configuration(format!(
                "document not found: {}",
                self.path.display()
            )));
        }

        let text = fs::read_to_string(&self.path).map_err(|e| {
            RagError::Configuration(format!(
                "failed to read document {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Loaded document {} ({} bytes)", self.path.display(), text.len());

        Ok(Document {
            source: self.path.display().to_string(),
            text,
        })
    }
}

/// Serves a document held in memory
#[derive(Debug, Clone)]
pub struct InlineSource {
    document: Document,
}

impl InlineSource {
    #[inline]
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document: Document {
                source: source.into(),
                text: text.into(),
            },
        }
    }
}

impl DocumentSource for InlineSource {
    #[inline]
    fn load(&self) -> Result<Document> {
        Ok(self.document.clone())
    }
}
