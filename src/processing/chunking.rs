//! Page-oriented chunking of PDF documents.
//!
//! Text is extracted page by page and each page's trimmed text is cut into consecutive,
//! non-overlapping windows of at most `max_chars` characters (Unicode scalar values, never
//! bytes). Pages are numbered from 1 in document order and windows from 1 within each page;
//! keys derived from these coordinates rely on the ordering being stable across runs.

use std::path::Path;

use super::types::ChunkingError;

/// Bounded slice of one page's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text.
    pub text: String,
    /// 1-based page number.
    pub page: usize,
    /// 1-based window number within the page.
    pub chunk_index: usize,
}

/// Source of per-page text for a document.
pub trait PageReader: Send + Sync {
    /// Return the text of every page of `path`, in page order.
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ChunkingError>;
}

/// [`PageReader`] backed by the PDF text extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageReader;

impl PageReader for PdfPageReader {
    fn read_pages(&self, path: &Path) -> Result<Vec<String>, ChunkingError> {
        read_pdf_pages(path)
    }
}

/// Read a PDF and split every page into chunks of at most `max_chars` characters.
pub fn extract_chunks(path: &Path, max_chars: usize) -> Result<Vec<Chunk>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    let pages = PdfPageReader.read_pages(path)?;
    chunk_pages(&pages, max_chars)
}

/// Extract the text of each page of the PDF at `path`, in page order.
pub fn read_pdf_pages(path: &Path) -> Result<Vec<String>, ChunkingError> {
    let bytes = std::fs::read(path).map_err(|source| ChunkingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pages =
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|err| ChunkingError::Pdf {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    tracing::debug!(path = %path.display(), pages = pages.len(), "Extracted page text");
    Ok(pages)
}

/// Split already-extracted page texts into chunks.
///
/// Pages whose text is empty after trimming produce no chunks but still advance the page
/// counter.
pub fn chunk_pages<S: AsRef<str>>(
    pages: &[S],
    max_chars: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::new();
    for (page_offset, page_text) in pages.iter().enumerate() {
        let page = page_offset + 1;
        let trimmed = page_text.as_ref().trim();
        for (window_offset, window) in split_text_by_length(trimmed, max_chars).enumerate() {
            chunks.push(Chunk {
                text: window.to_string(),
                page,
                chunk_index: window_offset + 1,
            });
        }
    }
    Ok(chunks)
}

/// Iterate over consecutive windows of at most `max_chars` characters.
///
/// Empty input yields no windows; only the last window may be shorter than `max_chars`.
pub fn split_text_by_length(text: &str, max_chars: usize) -> impl Iterator<Item = &str> + '_ {
    let max_chars = max_chars.max(1);
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let split_at = rest
            .char_indices()
            .nth(max_chars)
            .map(|(offset, _)| offset)
            .unwrap_or(rest.len());
        let (window, tail) = rest.split_at(split_at);
        rest = tail;
        Some(window)
    })
}
