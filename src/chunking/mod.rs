
use std::ops::Range;
use std::sync::LazyLock;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+\s+").expect("sentence pattern should compile"));

/// An immutable unit of indexed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Trimmed, non-empty text of the chunk
    pub text: String,
    /// Position of this chunk among its siblings
    pub sequence_order: usize,
    /// Pass-through data, never interpreted by the index
    pub metadata: ChunkMetadata,
}

/// Metadata carried alongside a chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Identifier of the source document
    pub source: String,
    /// Byte range of the chunk text inside the source document
    pub span: Range<usize>,
}

/// Configuration for document chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Maximum number of trailing characters repeated at the start of the next chunk
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    #[inline]
    pub fn split(&self, document: &str, source: &str) -> Result<Vec<Chunk>> {
        split(document, self.chunk_size, self.overlap, source)
    }
}

/// Boundaries tried in order when a segment is longer than the chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

impl Boundary {
    const fn finer(self) -> Self {
        match self {
            Self::Paragraph => Self::Line,
            Self::Line => Self::Sentence,
            Self::Sentence => Self::Word,
            Self::Word | Self::Character => Self::Character,
        }
    }

    /// Byte offsets in `text` where a new piece starts, excluding 0 and `text.len()`
    fn cut_points(self, text: &str, chunk_size: usize) -> Vec<usize> {
        let cuts: Vec<usize> = match self {
            Self::Paragraph => text.match_indices("\n\n").map(|(i, s)| i + s.len()).collect(),
            Self::Line => text.match_indices('\n').map(|(i, _)| i + 1).collect(),
            Self::Sentence => SENTENCE_END
                .find_iter(text)
                .filter_map(std::result::Result::ok)
                .map(|m| m.end())
                .collect(),
            Self::Word => {
                let mut cuts = Vec::new();
                let mut after_space = false;
                for (i, c) in text.char_indices() {
                    if c.is_whitespace() {
                        after_space = true;
                    } else if after_space {
                        cuts.push(i);
                        after_space = false;
                    }
                }
                cuts
            }
            Self::Character => text
                .char_indices()
                .map(|(i, _)| i)
                .step_by(chunk_size.max(1))
                .collect(),
        };

        cuts.into_iter()
            .filter(|&cut| cut > 0 && cut < text.len())
            .collect()
    }
}

/// Split a document into overlapping chunks of at most `chunk_size` characters.
///
/// Paragraph breaks are preferred, then line breaks, sentence ends and word
/// breaks, with a hard character cut as the last resort. Overlap is aligned to
/// those boundaries, so a chunk may repeat fewer than `overlap` characters of
/// its predecessor.
#[inline]
pub fn split(document: &str, chunk_size: usize, overlap: usize, source: &str) -> Result<Vec<Chunk>> {
    if document.trim().is_empty() {
        return Err(RagError::InvalidInput("document is empty".to_string()));
    }
    if chunk_size == 0 {
        return Err(RagError::InvalidInput(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(RagError::InvalidInput(format!(
            "overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    let mut segments = Vec::new();
    segment(
        document,
        0..document.len(),
        Boundary::Paragraph,
        chunk_size,
        &mut segments,
    );

    let windows = merge_segments(document, &segments, chunk_size, overlap);

    let mut chunks: Vec<Chunk> = Vec::with_capacity(windows.len());
    let mut covered_until = 0;
    for window in windows {
        let Some(span) = trimmed_span(document, window) else {
            continue;
        };
        // Skip windows that only repeat text already covered by the previous chunk
        if !chunks.is_empty() && span.end <= covered_until {
            continue;
        }
        covered_until = span.end;

        chunks.push(Chunk {
            text: slice(document, span.clone()).to_string(),
            sequence_order: chunks.len(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                span,
            },
        });
    }

    debug!(
        "Split '{}' ({} chars) into {} chunks (size {}, overlap {})",
        source,
        char_len(document),
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

/// Recursively cut `range` into contiguous segments of at most `chunk_size` characters
fn segment(
    document: &str,
    range: Range<usize>,
    boundary: Boundary,
    chunk_size: usize,
    out: &mut Vec<Range<usize>>,
) {
    let text = slice(document, range.clone());
    if char_len(text) <= chunk_size {
        out.push(range);
        return;
    }

    let mut start = 0;
    for end in boundary
        .cut_points(text, chunk_size)
        .into_iter()
        .chain(std::iter::once(text.len()))
    {
        segment(
            document,
            range.start + start..range.start + end,
            boundary.finer(),
            chunk_size,
            out,
        );
        start = end;
    }
}

/// Greedily merge segments into windows, carrying trailing segments forward as overlap
fn merge_segments(
    document: &str,
    segments: &[Range<usize>],
    chunk_size: usize,
    overlap: usize,
) -> Vec<Range<usize>> {
    let lengths: Vec<usize> = segments
        .iter()
        .map(|s| char_len(slice(document, s.clone())))
        .collect();

    let mut windows = Vec::new();
    let mut first = 0;
    let mut window_len = 0;

    for (i, &segment_len) in lengths.iter().enumerate() {
        if window_len + segment_len > chunk_size && i > first {
            windows.push(segments[first].start..segments[i - 1].end);

            let mut start = i;
            let mut carried = 0;
            while start > first {
                let candidate = carried + lengths[start - 1];
                if candidate > overlap || candidate + segment_len > chunk_size {
                    break;
                }
                carried = candidate;
                start -= 1;
            }

            first = start;
            window_len = carried;
        }
        window_len += segment_len;
    }

    if let Some(last) = segments.last() {
        if first < segments.len() {
            windows.push(segments[first].start..last.end);
        }
    }

    windows
}

/// Narrow a window to its non-whitespace content, or `None` if it has none
fn trimmed_span(document: &str, window: Range<usize>) -> Option<Range<usize>> {
    let text = slice(document, window.clone());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let leading = text.len() - text.trim_start().len();
    let start = window.start + leading;
    Some(start..start + trimmed.len())
}

fn slice(document: &str, range: Range<usize>) -> &str {
    document.get(range).unwrap_or_default()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
