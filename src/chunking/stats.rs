//! Pure descriptive statistics over a produced chunk sequence.

use super::Chunk;
use serde::Serialize;

/// Parse provenance for one previewed file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProvenance {
    /// Uploaded file name.
    pub filename: String,
    /// Parser backend that decoded the file.
    pub parser_used: String,
    /// Time the backend spent decoding, in milliseconds.
    pub parse_time_ms: u64,
    /// Page count reported by the backend.
    pub pages: usize,
}

/// Aggregate view of a chunk sequence, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStats {
    /// Number of chunks produced.
    pub total_chunks: usize,
    /// Rounded arithmetic mean chunk length in characters.
    pub avg_chunk_length: usize,
    /// Shortest chunk length in characters.
    pub min_chunk_length: usize,
    /// Longest chunk length in characters.
    pub max_chunk_length: usize,
    /// First chunk of the sequence, when any.
    pub first_chunk: Option<Chunk>,
    /// Last chunk of the sequence, when any.
    pub last_chunk: Option<Chunk>,
    /// The full ordered chunk list.
    pub chunks: Vec<Chunk>,
    /// Per-file parse provenance.
    pub files: Vec<FileProvenance>,
}

/// Compute statistics over `chunks` with pass-through `files` provenance.
pub fn chunk_stats(chunks: Vec<Chunk>, files: Vec<FileProvenance>) -> ChunkStats {
    let total_chunks = chunks.len();
    let (min_chunk_length, max_chunk_length, sum) = chunks.iter().fold(
        (usize::MAX, 0usize, 0usize),
        |(min, max, sum), chunk| (min.min(chunk.length), max.max(chunk.length), sum + chunk.length),
    );
    let avg_chunk_length = if total_chunks == 0 {
        0
    } else {
        (sum as f64 / total_chunks as f64).round() as usize
    };

    ChunkStats {
        total_chunks,
        avg_chunk_length,
        min_chunk_length: if total_chunks == 0 { 0 } else { min_chunk_length },
        max_chunk_length,
        first_chunk: chunks.first().cloned(),
        last_chunk: chunks.last().cloned(),
        chunks,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            text: text.to_string(),
            length: text.chars().count(),
        }
    }

    #[test]
    fn stats_order_invariant_holds() {
        let chunks = vec![chunk(0, "short"), chunk(1, "a longer chunk body"), chunk(2, "medium one")];
        let stats = chunk_stats(chunks.clone(), Vec::new());

        assert_eq!(stats.total_chunks, chunks.len());
        assert!(stats.min_chunk_length <= stats.avg_chunk_length);
        assert!(stats.avg_chunk_length <= stats.max_chunk_length);
        assert_eq!(stats.first_chunk.as_ref().unwrap().text, "short");
        assert_eq!(stats.last_chunk.as_ref().unwrap().text, "medium one");
    }

    #[test]
    fn mean_is_rounded() {
        let stats = chunk_stats(vec![chunk(0, "ab"), chunk(1, "abc")], Vec::new());
        // (2 + 3) / 2 = 2.5 rounds up.
        assert_eq!(stats.avg_chunk_length, 3);
    }

    #[test]
    fn empty_sequence_produces_zeroed_stats() {
        let stats = chunk_stats(Vec::new(), Vec::new());
        assert_eq!(stats.total_chunks, 0);
        assert_eq!(stats.avg_chunk_length, 0);
        assert_eq!(stats.min_chunk_length, 0);
        assert_eq!(stats.max_chunk_length, 0);
        assert!(stats.first_chunk.is_none());
        assert!(stats.last_chunk.is_none());
    }

    #[test]
    fn provenance_passes_through() {
        let files = vec![FileProvenance {
            filename: "paper.pdf".into(),
            parser_used: "pdf-extract".into(),
            parse_time_ms: 12,
            pages: 4,
        }];
        let stats = chunk_stats(vec![chunk(0, "body")], files);
        assert_eq!(stats.files.len(), 1);
        assert_eq!(stats.files[0].parser_used, "pdf-extract");
    }
}
