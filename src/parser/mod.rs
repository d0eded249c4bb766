//! PDF parser backends behind a closed registry.
//!
//! Every backend exposes the same contract: raw bytes in, extracted text plus
//! document metadata and timing out. Backends are selected by name or by a set
//! of required capabilities, and a convenience entry point can fall back to the
//! deterministic stub backend when the selected one fails (development only).

mod backends;

pub use backends::decode_pdf_string;

use std::time::Instant;
use thiserror::Error;

/// Errors raised while selecting a parser backend.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Requested backend name is not part of the registry.
    #[error("unknown pdf parser '{name}'; valid backends: {valid}")]
    UnknownBackend {
        /// Name supplied by the caller.
        name: String,
        /// Comma-separated list of registered backend names.
        valid: String,
    },
}

/// Errors raised while decoding a document with a chosen backend.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The backend library failed to decode the input bytes.
    #[error("pdf parser '{backend}' failed: {message}")]
    Backend {
        /// Backend that was invoked.
        backend: &'static str,
        /// Description of the underlying failure.
        message: String,
    },
    /// The backend ran but produced no extractable text.
    #[error("pdf parser '{backend}' produced no extractable text")]
    EmptyDocument {
        /// Backend that was invoked.
        backend: &'static str,
    },
}

/// Boolean capability flags advertised by each backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserCapabilities {
    /// Can pull plain text out of the document body.
    pub text_extraction: bool,
    /// Can read the document information dictionary.
    pub metadata_extraction: bool,
    /// Can open encrypted documents.
    pub encrypted_files: bool,
    /// Can extract embedded images.
    pub image_extraction: bool,
    /// Preserves layout/formatting in the extracted text.
    pub formatting_preservation: bool,
    /// Performs optical character recognition.
    pub ocr: bool,
}

impl ParserCapabilities {
    fn satisfies(&self, required: &ParserCapabilities) -> bool {
        (!required.text_extraction || self.text_extraction)
            && (!required.metadata_extraction || self.metadata_extraction)
            && (!required.encrypted_files || self.encrypted_files)
            && (!required.image_extraction || self.image_extraction)
            && (!required.formatting_preservation || self.formatting_preservation)
            && (!required.ocr || self.ocr)
    }
}

/// Metadata lifted from the document information dictionary.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PdfMetadata {
    /// Number of pages in the document.
    pub pages: usize,
    /// Document title, when present.
    pub title: Option<String>,
    /// Document author, when present.
    pub author: Option<String>,
    /// Producing application, when present.
    pub creator: Option<String>,
    /// Document subject, when present.
    pub subject: Option<String>,
    /// Keyword string, when present.
    pub keywords: Option<String>,
    /// Raw creation date string, when present.
    pub creation_date: Option<String>,
    /// Raw modification date string, when present.
    pub modification_date: Option<String>,
}

/// Outcome of decoding one uploaded file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Extracted plain text, cleaned of null bytes and blank lines.
    pub text: String,
    /// Document-level metadata.
    pub metadata: PdfMetadata,
    /// Wall-clock time the backend spent decoding, in milliseconds.
    pub parse_time_ms: u64,
    /// Name of the backend that produced this result.
    pub parser_used: &'static str,
}

/// Closed set of registered parser backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Text via the `pdf-extract` crate, metadata via `lopdf`.
    PdfExtract,
    /// Content-stream extraction and metadata via `lopdf` only.
    Lopdf,
    /// Deterministic lossy UTF-8 decode of the raw bytes.
    Stub,
}

/// Backend applied when neither the request nor the capability match names one.
pub const DEFAULT_PARSER: ParserKind = ParserKind::PdfExtract;

impl ParserKind {
    /// Registry in selection order.
    pub const ALL: [ParserKind; 3] = [ParserKind::PdfExtract, ParserKind::Lopdf, ParserKind::Stub];

    /// Stable name used in request fields and stored provenance.
    pub const fn name(self) -> &'static str {
        match self {
            ParserKind::PdfExtract => "pdf-extract",
            ParserKind::Lopdf => "lopdf",
            ParserKind::Stub => "stub",
        }
    }

    /// Capabilities advertised by this backend.
    pub const fn capabilities(self) -> ParserCapabilities {
        match self {
            ParserKind::PdfExtract => ParserCapabilities {
                text_extraction: true,
                metadata_extraction: true,
                encrypted_files: false,
                image_extraction: false,
                formatting_preservation: false,
                ocr: false,
            },
            ParserKind::Lopdf => ParserCapabilities {
                text_extraction: true,
                metadata_extraction: true,
                encrypted_files: true,
                image_extraction: false,
                formatting_preservation: false,
                ocr: false,
            },
            ParserKind::Stub => ParserCapabilities {
                text_extraction: true,
                metadata_extraction: false,
                encrypted_files: false,
                image_extraction: false,
                formatting_preservation: false,
                ocr: false,
            },
        }
    }

    /// Resolve a backend by its registered name.
    pub fn from_name(name: &str) -> Result<Self, ParserError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ParserError::UnknownBackend {
                name: name.to_string(),
                valid: registered_names().join(", "),
            })
    }

    /// Pick the first backend satisfying every required capability.
    ///
    /// Falls back to [`DEFAULT_PARSER`] when no backend matches or nothing
    /// is required.
    pub fn for_capabilities(required: &ParserCapabilities) -> Self {
        if *required == ParserCapabilities::default() {
            return DEFAULT_PARSER;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.capabilities().satisfies(required))
            .unwrap_or(DEFAULT_PARSER)
    }

    /// Decode the supplied bytes with this backend.
    pub fn parse(self, bytes: &[u8]) -> Result<ParseResult, ParseError> {
        let started = Instant::now();
        let (text, metadata) = match self {
            ParserKind::PdfExtract => backends::parse_pdf_extract(bytes)?,
            ParserKind::Lopdf => backends::parse_lopdf(bytes)?,
            ParserKind::Stub => backends::parse_stub(bytes),
        };
        Ok(ParseResult {
            text,
            metadata,
            parse_time_ms: started.elapsed().as_millis() as u64,
            parser_used: self.name(),
        })
    }
}

/// Names of every registered backend, in selection order.
pub fn registered_names() -> Vec<&'static str> {
    ParserKind::ALL.iter().map(|kind| kind.name()).collect()
}

/// Decode `bytes` with `kind`, optionally falling back to the stub backend.
///
/// The stub fallback is useful only outside production: it keeps ingestion
/// flowing during development when a backend chokes on an input, at the cost
/// of garbage text for binary documents.
pub fn parse_with_fallback(
    bytes: &[u8],
    kind: ParserKind,
    allow_stub: bool,
) -> Result<ParseResult, ParseError> {
    match kind.parse(bytes) {
        Ok(result) => Ok(result),
        Err(error) if allow_stub && kind != ParserKind::Stub => {
            tracing::warn!(
                backend = kind.name(),
                error = %error,
                "Parser failed; falling back to stub backend"
            );
            Ok(ParserKind::Stub
                .parse(bytes)
                .unwrap_or_else(|_| unreachable!("stub backend is infallible")))
        }
        Err(error) => Err(error),
    }
}
