//! Backend implementations for the parser registry.

use super::{ParseError, PdfMetadata};
use lopdf::{Document, Object};

/// Extract text with `pdf-extract`, reading metadata and page count via `lopdf`.
pub(super) fn parse_pdf_extract(bytes: &[u8]) -> Result<(String, PdfMetadata), ParseError> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|err| ParseError::Backend {
        backend: "pdf-extract",
        message: err.to_string(),
    })?;
    let text = cleanup_text(&raw);
    if text.is_empty() {
        return Err(ParseError::EmptyDocument {
            backend: "pdf-extract",
        });
    }

    // Metadata is best effort; a text-only result is still usable.
    let metadata = Document::load_mem(bytes)
        .map(|doc| read_metadata(&doc))
        .unwrap_or_default();

    Ok((text, metadata))
}

/// Extract text straight from the content streams with `lopdf`.
///
/// Walks BT/ET text blocks and collects `Tj`/`TJ` show operators. Cruder than
/// `pdf-extract` but tolerates documents that crate rejects, including some
/// encrypted files `lopdf` can open.
pub(super) fn parse_lopdf(bytes: &[u8]) -> Result<(String, PdfMetadata), ParseError> {
    let doc = Document::load_mem(bytes).map_err(|err| ParseError::Backend {
        backend: "lopdf",
        message: err.to_string(),
    })?;

    let mut all_text = String::new();
    for (page_number, page_id) in doc.get_pages() {
        match doc.get_page_content(page_id) {
            Ok(content) => {
                let page_text = text_from_content_stream(&content);
                if !page_text.is_empty() {
                    all_text.push_str(&page_text);
                    all_text.push('\n');
                }
            }
            Err(err) => {
                tracing::debug!(page = page_number, error = %err, "Skipping unreadable page");
            }
        }
    }

    let text = cleanup_text(&all_text);
    if text.is_empty() {
        return Err(ParseError::EmptyDocument { backend: "lopdf" });
    }

    let metadata = read_metadata(&doc);
    Ok((text, metadata))
}

/// Deterministic stub: lossy UTF-8 decode of the raw bytes, no metadata.
pub(super) fn parse_stub(bytes: &[u8]) -> (String, PdfMetadata) {
    (
        String::from_utf8_lossy(bytes).into_owned(),
        PdfMetadata::default(),
    )
}

/// Strip null bytes, trim lines, and drop blanks from extracted text.
fn cleanup_text(raw: &str) -> String {
    raw.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read pages and the document information dictionary.
fn read_metadata(doc: &Document) -> PdfMetadata {
    PdfMetadata {
        pages: doc.get_pages().len(),
        title: info_string(doc, b"Title"),
        author: info_string(doc, b"Author"),
        creator: info_string(doc, b"Creator"),
        subject: info_string(doc, b"Subject"),
        keywords: info_string(doc, b"Keywords"),
        creation_date: info_string(doc, b"CreationDate"),
        modification_date: info_string(doc, b"ModDate"),
    }
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let decoded = decode_pdf_string(bytes);
            let trimmed = decoded.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

/// Decode a PDF string value, honoring the UTF-16BE byte-order mark.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn text_from_content_stream(content: &[u8]) -> String {
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;

    for line in content_str.lines() {
        let line = line.trim();
        if line == "BT" {
            in_text_block = true;
            continue;
        }
        if line == "ET" {
            in_text_block = false;
            if !text.ends_with(' ') && !text.is_empty() {
                text.push(' ');
            }
            continue;
        }
        if in_text_block
            && (line.ends_with("Tj") || line.ends_with("TJ"))
            && let Some(start) = line.find('(')
            && let Some(end) = line.rfind(')')
            && start < end
        {
            let decoded = line[start + 1..end]
                .replace("\\n", "\n")
                .replace("\\r", "\r")
                .replace("\\t", "\t")
                .replace("\\(", "(")
                .replace("\\)", ")")
                .replace("\\\\", "\\");
            text.push_str(&decoded);
        }
    }

    text
}
