//! Text splitting strategies and chunk statistics.
//!
//! Splitting walks the text with a character-budgeted window, snapping each
//! cut to the best separator the selected strategy knows about, and restarts
//! the window `chunk_overlap` characters before the cut so adjacent chunks
//! share context. Statistics are a pure aggregation over the produced chunks
//! used by the preview endpoint's dry-run path.

mod splitter;
mod stats;

pub use splitter::{
    Chunk, ChunkingError, SplitStrategy, split_text, strategy_names, validate_split_bounds,
};
pub use stats::{ChunkStats, FileProvenance, chunk_stats};
