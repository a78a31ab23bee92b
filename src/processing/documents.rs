//! Resolve indexing targets into an ordered list of PDF files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::types::DiscoveryError;

/// Expand `paths` into document files.
///
/// Files are taken as given; directories are walked recursively and contribute every file
/// with a `.pdf` extension (any case), sorted by path. Duplicates are dropped, keeping the
/// first occurrence.
pub fn discover_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut documents: Vec<PathBuf> = Vec::new();

    for root in paths {
        if root.is_file() {
            push_unique(&mut documents, root.clone());
            continue;
        }
        if !root.is_dir() {
            return Err(DiscoveryError::NotFound(root.clone()));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                path: root.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_pdf(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::debug!(root = %root.display(), documents = found.len(), "Discovered documents");
        for path in found {
            push_unique(&mut documents, path);
        }
    }

    Ok(documents)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn push_unique(documents: &mut Vec<PathBuf>, path: PathBuf) {
    if !documents.contains(&path) {
        documents.push(path);
    }
}
