//! Overlapping window splitter with strategy-specific separators.

use serde::Serialize;
use thiserror::Error;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible chunk budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would swallow the whole chunk and stall the window.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapExceedsChunkSize {
        /// Configured chunk size in characters.
        chunk_size: usize,
        /// Configured overlap in characters.
        overlap: usize,
    },
    /// Requested strategy name is not registered.
    #[error("unknown splitter '{name}'; valid strategies: {valid}")]
    UnknownStrategy {
        /// Name supplied by the caller.
        name: String,
        /// Comma-separated list of valid strategy names.
        valid: String,
    },
}

/// Separator preference applied when snapping a chunk boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Generic hierarchy: paragraph break, newline, space.
    #[default]
    Recursive,
    /// Single fixed separator (paragraph break).
    Character,
    /// Heading markers first, then the generic hierarchy.
    Markdown,
    /// Block-tag closings first, then the generic hierarchy.
    Html,
}

impl SplitStrategy {
    const ALL: [SplitStrategy; 4] = [
        SplitStrategy::Recursive,
        SplitStrategy::Character,
        SplitStrategy::Markdown,
        SplitStrategy::Html,
    ];

    /// Stable name used in request fields.
    pub const fn name(self) -> &'static str {
        match self {
            SplitStrategy::Recursive => "recursive",
            SplitStrategy::Character => "character",
            SplitStrategy::Markdown => "markdown",
            SplitStrategy::Html => "html",
        }
    }

    /// Resolve a strategy by its registered name.
    pub fn from_name(name: &str) -> Result<Self, ChunkingError> {
        Self::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.name() == name)
            .ok_or_else(|| ChunkingError::UnknownStrategy {
                name: name.to_string(),
                valid: strategy_names().join(", "),
            })
    }

    /// Boundary separators in priority order.
    const fn separators(self) -> &'static [&'static str] {
        match self {
            SplitStrategy::Recursive => &["\n\n", "\n", " "],
            SplitStrategy::Character => &["\n\n"],
            SplitStrategy::Markdown => &[
                "\n# ", "\n## ", "\n### ", "\n#### ", "\n\n", "\n", " ",
            ],
            SplitStrategy::Html => &[
                "</p>", "</div>", "</section>", "</article>", "</li>", "\n\n", "\n", " ",
            ],
        }
    }
}

/// Names of every registered strategy.
pub fn strategy_names() -> Vec<&'static str> {
    SplitStrategy::ALL
        .iter()
        .map(|strategy| strategy.name())
        .collect()
}

/// Check a chunk budget without splitting anything.
///
/// The upload endpoints call this once per request so a bad budget fails the
/// whole request instead of being absorbed by per-file error handling.
pub fn validate_split_bounds(chunk_size: usize, chunk_overlap: usize) -> Result<(), ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if chunk_overlap >= chunk_size {
        return Err(ChunkingError::OverlapExceedsChunkSize {
            chunk_size,
            overlap: chunk_overlap,
        });
    }
    Ok(())
}

/// A contiguous substring of a document's extracted text.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk within the document's chunk sequence.
    pub index: usize,
    /// Chunk body.
    pub text: String,
    /// Body length in characters.
    pub length: usize,
}

/// Split `text` into an ordered sequence of overlapping chunks.
///
/// Each chunk holds at most `chunk_size` characters; each non-first chunk
/// begins with the final `chunk_overlap` characters of its predecessor.
/// Whitespace-only input yields an empty sequence. Overlap must be strictly
/// smaller than the chunk size.
pub fn split_text(
    text: &str,
    strategy: SplitStrategy,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    validate_split_bounds(chunk_size, chunk_overlap)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let separators = strategy.separators();
    let len = text.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let window_end = byte_index_after_chars(text, start, chunk_size);
        let end = if window_end >= len {
            len
        } else {
            snap_cut(text, start, window_end, separators)
        };

        let piece = &text[start..end];
        chunks.push(Chunk {
            index: chunks.len(),
            length: piece.chars().count(),
            text: piece.to_string(),
        });

        if end == len {
            break;
        }

        // Restart the window `chunk_overlap` characters before the cut; fall
        // back to a clean continuation when the chunk was shorter than that.
        let next_start = byte_index_before_chars(text, end, chunk_overlap);
        start = if next_start > start { next_start } else { end };
    }

    Ok(chunks)
}

/// Byte index after `count` characters starting at byte `start`.
fn byte_index_after_chars(text: &str, start: usize, count: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(count)
        .map(|(offset, _)| start + offset)
        .unwrap_or(text.len())
}

/// Byte index `count` characters before byte `end`.
fn byte_index_before_chars(text: &str, end: usize, count: usize) -> usize {
    let mut idx = end;
    for _ in 0..count {
        match text[..idx].char_indices().next_back() {
            Some((offset, _)) => idx = offset,
            None => return 0,
        }
    }
    idx
}

/// Choose the cut for the window `[start, window_end)`.
///
/// The highest-priority separator whose last occurrence lands in the second
/// half of the window wins; otherwise the window is cut at its hard limit.
/// The separator stays attached to the chunk it closes.
fn snap_cut(text: &str, start: usize, window_end: usize, separators: &[&str]) -> usize {
    let window = &text[start..window_end];
    let min_cut = window.len() / 2;
    for separator in separators {
        if let Some(position) = window.rfind(separator) {
            let cut = position + separator.len();
            if cut > min_cut && cut < window.len() {
                return start + cut;
            }
        }
    }
    window_end
}
