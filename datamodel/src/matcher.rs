//! Matching data model documents to the real files they describe.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::catalog::{discover_files, DocumentModel};
use crate::core::DataModelError;
use crate::log::LogSink;

/// Files found for one document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchResult {
    pub document: PathBuf,
    /// Sorted matching paths.
    pub matches: Vec<PathBuf>,
    pub prototype: Option<PathBuf>,
    pub no_matcher: bool,
    pub no_matches: bool,
}

/// Attach a matcher under `data_root` to every document.
pub fn files_to_regexp(
    data_root: &Path,
    documents: &mut [DocumentModel],
    sink: &mut dyn LogSink,
) -> Result<(), DataModelError> {
    for document in documents.iter_mut() {
        document.get_regexp(data_root, sink)?;
    }
    Ok(())
}

/// Walk `data_root` and give every real file to the first document whose
/// matcher accepts it. Each document's prototype becomes its smallest match.
pub fn collect_files(
    data_root: &Path,
    documents: &mut [DocumentModel],
    sink: &mut dyn LogSink,
) -> Result<Vec<MatchResult>, DataModelError> {
    let files = discover_files(data_root, &|_| true)?;
    let mut matches: Vec<Vec<PathBuf>> = vec![Vec::new(); documents.len()];

    for file in files {
        let owner = documents
            .iter()
            .position(|d| d.regexp().map_or(false, |r| r.is_match(&file)));
        match owner {
            Some(i) => {
                tracing::debug!("{} matches {}.", file.display(), documents[i].filename().display());
                matches[i].push(file);
            }
            None => sink.warning(format!("Extraneous file detected: {}", file.display())),
        }
    }

    let mut results = Vec::with_capacity(documents.len());
    for (document, mut found) in documents.iter_mut().zip(matches) {
        found.sort();
        let no_matcher = document.regexp().is_none();
        let no_matches = !no_matcher && found.is_empty();
        if no_matches {
            sink.warning(format!(
                "No files found matching {}!",
                document.filename().display()
            ));
        }
        document.prototype = found.first().cloned();
        results.push(MatchResult {
            document: document.filename().to_path_buf(),
            matches: found,
            prototype: document.prototype.clone(),
            no_matcher,
            no_matches,
        });
    }
    Ok(results)
}
