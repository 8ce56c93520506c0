//! Data model documents and their discovery.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::DataModelError;
use crate::log::LogSink;
use crate::parser::pattern::{declared_regex, find_declared_regex, FilePattern};
use crate::parser::rst::extract_schema;
use crate::parser::schema::Schema;

const DOC_EXTENSION: &str = "rst";
const IGNORED_DOCUMENTS: &[&str] = &["index.rst"];
const MAX_DEPTH: usize = 32;

fn cross_reference_regex() -> &'static Regex {
    static XREF: OnceLock<Regex> = OnceLock::new();
    XREF.get_or_init(|| Regex::new(r"See :doc:`[^<`]+<([^>`]+)>`").expect("static regex"))
}

/// One documentation file and everything derived from it.
#[derive(Debug, Clone)]
pub struct DocumentModel {
    filename: PathBuf,
    section: PathBuf,
    text: Option<String>,
    reference: Option<PathBuf>,
    reference_text: Option<String>,
    regexp: Option<FilePattern>,
    schema: Option<Schema>,
    pub prototype: Option<PathBuf>,
}

impl DocumentModel {
    /// A document on disk, discovered under `section`. Nothing is read yet.
    pub fn new(filename: impl Into<PathBuf>, section: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            section: section.into(),
            text: None,
            reference: None,
            reference_text: None,
            regexp: None,
            schema: None,
            prototype: None,
        }
    }

    /// A document whose text is supplied directly instead of read from
    /// `filename`.
    pub fn from_text(
        filename: impl Into<PathBuf>,
        section: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        let mut model = Self::new(filename, section);
        model.text = Some(text.into());
        model
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn section(&self) -> &Path {
        &self.section
    }

    pub fn regexp(&self) -> Option<&FilePattern> {
        self.regexp.as_ref()
    }

    pub fn reference(&self) -> Option<&Path> {
        self.reference.as_deref()
    }

    /// The document that actually carries the metadata: the cross-referenced
    /// one when there is a reference, this one otherwise.
    pub fn metafile(&self) -> &Path {
        self.reference.as_deref().unwrap_or(&self.filename)
    }

    pub fn text(&mut self) -> Result<&str, DataModelError> {
        self.load_text()?;
        Ok(self.text.as_deref().unwrap_or_default())
    }

    fn load_text(&mut self) -> Result<(), DataModelError> {
        if self.text.is_none() {
            self.text = Some(fs::read_to_string(&self.filename)?);
        }
        Ok(())
    }

    /// Resolve a `See :doc:`Label <stem>`` line to the referenced document.
    /// A stem starting with `/` is relative to the section root, any other
    /// stem to this document's directory. `None` when the line holds no
    /// reference or the target does not exist.
    pub fn cross_reference(&self, line: &str) -> Option<PathBuf> {
        let caps = cross_reference_regex().captures(line)?;
        let stem = caps.get(1)?.as_str().trim();
        let file = format!("{}.{}", stem.trim_start_matches('/'), DOC_EXTENSION);
        let target = if stem.starts_with('/') {
            self.section.join(file)
        } else {
            self.filename
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(file)
        };
        if target.is_file() {
            Some(target)
        } else {
            tracing::debug!(
                "Unresolved cross reference in {}: {}",
                self.filename.display(),
                target.display()
            );
            None
        }
    }

    /// Scan the text for the first filename declaration or cross reference,
    /// whichever comes first.
    fn scan_declarations(&mut self) -> Result<Option<String>, DataModelError> {
        self.load_text()?;
        let text = self.text.as_deref().unwrap_or_default();
        let mut declared = None;
        let mut reference = None;
        for line in text.lines() {
            if line.starts_with("See :doc:") {
                reference = self.cross_reference(line);
                if reference.is_some() {
                    break;
                }
            }
            if let Some(r) = declared_regex(line) {
                declared = Some(r);
                break;
            }
        }
        if let Some(target) = reference {
            tracing::debug!(
                "Cross reference detected {} -> {}.",
                self.filename.display(),
                target.display()
            );
            if self.reference.as_ref() != Some(&target) {
                self.reference_text = None;
            }
            self.reference = Some(target);
        }
        Ok(declared)
    }

    fn metadata_text(&mut self) -> Result<&str, DataModelError> {
        self.scan_declarations()?;
        if let Some(target) = &self.reference {
            if self.reference_text.is_none() {
                self.reference_text = Some(fs::read_to_string(target)?);
            }
            return Ok(self.reference_text.as_deref().unwrap_or_default());
        }
        Ok(self.text.as_deref().unwrap_or_default())
    }

    /// Build the matcher for this document's files under `data_root`.
    ///
    /// A document with no declaration, directly or through its cross
    /// reference, is logged and keeps no matcher.
    pub fn get_regexp(
        &mut self,
        data_root: &Path,
        sink: &mut dyn LogSink,
    ) -> Result<Option<&FilePattern>, DataModelError> {
        let mut declared = self.scan_declarations()?;
        if declared.is_none() {
            if let Some(target) = self.reference.clone() {
                let text = fs::read_to_string(&target)?;
                declared = find_declared_regex(&text);
                self.reference_text = Some(text);
            }
        }

        self.regexp = None;
        match declared {
            Some(filename_regex) => {
                let dir = self.filename.parent().unwrap_or_else(|| Path::new(""));
                let relative = dir.strip_prefix(&self.section).unwrap_or_else(|_| Path::new(""));
                match FilePattern::compile(data_root, relative, &filename_regex) {
                    Ok(pattern) => self.regexp = Some(pattern),
                    Err(e) => sink.warning(format!(
                        "{} has an invalid file regexp: {}",
                        self.filename.display(),
                        e
                    )),
                }
            }
            None => sink.warning(format!("{} has no file regexp!", self.filename.display())),
        }
        Ok(self.regexp.as_ref())
    }

    /// Parse the metadata tables into a fresh schema.
    ///
    /// Strict mode stops at the first defect and returns it as the error;
    /// otherwise every defect is logged and a best-effort schema comes back.
    /// A successful extraction refreshes the cached schema.
    pub fn extract_metadata(
        &mut self,
        strict: bool,
        sink: &mut dyn LogSink,
    ) -> Result<Schema, DataModelError> {
        let text = self.metadata_text()?.to_string();
        let metafile = self.metafile().to_path_buf();
        let schema = extract_schema(&text, &metafile, strict, sink)?;
        self.schema = Some(schema.clone());
        Ok(schema)
    }

    /// Cached schema, extracted leniently on first use.
    pub fn schema(&mut self, sink: &mut dyn LogSink) -> Result<&Schema, DataModelError> {
        if self.schema.is_none() {
            self.extract_metadata(false, sink)?;
        }
        match &self.schema {
            Some(schema) => Ok(schema),
            None => Err(DataModelError::Model(format!(
                "No metadata extracted from {}.",
                self.metafile().display()
            ))),
        }
    }
}

/// Find every documentation file under `root`, sorted by path.
pub fn scan_model(root: &Path) -> Result<Vec<DocumentModel>, DataModelError> {
    let files = discover_files(root, &|path| {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        path.extension().and_then(|e| e.to_str()) == Some(DOC_EXTENSION)
            && !IGNORED_DOCUMENTS.contains(&name)
    })?;
    tracing::debug!("Found {} data model files under {}.", files.len(), root.display());
    Ok(files
        .into_iter()
        .map(|f| DocumentModel::new(f, root))
        .collect())
}

/// Recursively list files under `dir` accepted by `keep`, sorted.
pub fn discover_files(
    dir: &Path,
    keep: &dyn Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, DataModelError> {
    let mut files = Vec::new();
    walk_dir(dir, keep, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(
    dir: &Path,
    keep: &dyn Fn(&Path) -> bool,
    files: &mut Vec<PathBuf>,
    depth: usize,
) -> Result<(), DataModelError> {
    if depth > MAX_DEPTH {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') {
                continue;
            }
            walk_dir(&path, keep, files, depth + 1)?;
        } else if path.is_file() && keep(&path) {
            files.push(path);
        }
    }
    Ok(())
}
