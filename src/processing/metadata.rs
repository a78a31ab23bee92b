//! Key derivation and metadata construction for indexed chunks.

use std::path::Path;

use serde_json::{Map, Value};

use super::chunking::Chunk;

/// Metadata field holding the (byte-bounded) chunk text.
pub const SOURCE_TEXT_FIELD: &str = "source_text";
/// Metadata field holding the 1-based page number.
pub const PAGE_NUMBER_FIELD: &str = "page_number";
/// Metadata field holding the 1-based chunk number within the page.
pub const CHUNK_NUMBER_FIELD: &str = "chunk_number";
/// Metadata field holding the source file name.
pub const SOURCE_FILE_FIELD: &str = "source_file";

/// Derive the storage key for a chunk: `<source_file>-page-<page>-chunk-<chunk_index>`.
pub fn vector_key(source_file: &str, page: usize, chunk_index: usize) -> String {
    format!("{source_file}-page-{page}-chunk-{chunk_index}")
}

/// File name component used as `<source_file>` in keys and metadata.
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Return the longest prefix of `s` that fits in `max_bytes` UTF-8 bytes.
///
/// The byte-truncated buffer is shortened one byte at a time until it decodes, so a
/// multi-byte character straddling the limit is dropped entirely. Strings already within
/// budget are returned unchanged.
pub fn trim_to_max_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let bytes = s.as_bytes();
    let mut end = max_bytes;
    loop {
        match std::str::from_utf8(&bytes[..end]) {
            Ok(trimmed) => return trimmed,
            Err(_) => end -= 1,
        }
    }
}

/// Build the metadata map stored with a chunk's vector.
pub fn build_metadata(
    chunk: &Chunk,
    source_file: &str,
    max_metadata_bytes: usize,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(
        SOURCE_TEXT_FIELD.into(),
        Value::String(trim_to_max_bytes(&chunk.text, max_metadata_bytes).to_string()),
    );
    metadata.insert(PAGE_NUMBER_FIELD.into(), Value::from(chunk.page));
    metadata.insert(CHUNK_NUMBER_FIELD.into(), Value::from(chunk.chunk_index));
    metadata.insert(SOURCE_FILE_FIELD.into(), Value::String(source_file.to_string()));
    metadata
}
