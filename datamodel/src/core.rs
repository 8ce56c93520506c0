//! Whole-pipeline checking shared by the CLI and library callers.
//! No terminal or subscriber setup here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::catalog::scan_model;
use crate::log::{LogEntry, LogSink, MemoryLog, Severity};
use crate::matcher::{collect_files, files_to_regexp, MatchResult};
use crate::parser::fits::FitsReader;
use crate::validate::{validate_prototypes, MetadataReader, ValidationReport};

#[derive(Debug, thiserror::Error)]
pub enum DataModelError {
    #[error("{0}")]
    Model(String),
    #[error("{0}")]
    BadUnit(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed FITS file {}: {}", .path.display(), .reason)]
    Fits { path: PathBuf, reason: String },
    #[error("Invalid regular expression: {0}")]
    Pattern(#[from] regex::Error),
}

impl DataModelError {
    /// Defects found in the documentation itself, as opposed to failures
    /// reading it.
    pub fn is_defect(&self) -> bool {
        matches!(self, DataModelError::Model(_) | DataModelError::BadUnit(_))
    }
}

/// Options for a checking run.
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Root of the documentation tree.
    pub section: PathBuf,
    /// Root of the real data tree.
    pub directory: PathBuf,
    pub compare_files: bool,
    pub strict: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            section: PathBuf::from("."),
            directory: PathBuf::from("."),
            compare_files: false,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CheckStats {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Everything a run found.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub section: PathBuf,
    pub documents: Vec<PathBuf>,
    pub matches: Vec<MatchResult>,
    pub validations: Vec<ValidationReport>,
    pub log: Vec<LogEntry>,
    pub stats: CheckStats,
    /// A strict-mode error (or an unreadable document) stopped some document.
    pub failed: bool,
    pub generated_at: DateTime<Utc>,
}

impl CheckReport {
    pub fn has_critical(&self) -> bool {
        self.stats.critical > 0
    }

    pub fn total_messages(&self) -> usize {
        self.stats.critical + self.stats.warning + self.stats.info
    }
}

fn entries_to_stats(entries: &[LogEntry]) -> CheckStats {
    let mut stats = CheckStats::default();
    for e in entries {
        match e.severity {
            Severity::Critical => stats.critical += 1,
            Severity::Warning => stats.warning += 1,
            Severity::Info => stats.info += 1,
        }
    }
    stats
}

/// Core checking API used by the CLI.
pub struct ModelChecker;

impl ModelChecker {
    /// Check a documentation tree, reading prototypes with [`FitsReader`].
    pub fn run(options: &CheckOptions) -> Result<CheckReport, DataModelError> {
        let mut log = MemoryLog::new();
        Self::run_with(options, &FitsReader::new(), &mut log)
    }

    /// Check a documentation tree with an injected reader and log.
    ///
    /// Without `compare_files` every document's metadata is extracted. With
    /// it, documents are matched against `options.directory` and each
    /// prototype is validated. A strict-mode error stops only the document
    /// it came from and marks the report as failed.
    pub fn run_with(
        options: &CheckOptions,
        reader: &dyn MetadataReader,
        log: &mut MemoryLog,
    ) -> Result<CheckReport, DataModelError> {
        let mut documents = scan_model(&options.section)?;
        tracing::info!(
            "Checking {} data model files under {}.",
            documents.len(),
            options.section.display()
        );

        let mut matches = Vec::new();
        let mut validations = Vec::new();
        let mut failed = false;

        if options.compare_files {
            files_to_regexp(&options.directory, &mut documents, log)?;
            matches = collect_files(&options.directory, &mut documents, log)?;
            validations = validate_prototypes(&mut documents, reader, options.strict, log);
            failed = validations.iter().any(|r| r.aborted.is_some());
        } else {
            for document in documents.iter_mut() {
                if let Err(e) = document.extract_metadata(options.strict, log) {
                    if !e.is_defect() {
                        log.critical(format!("{}: {}", document.filename().display(), e));
                    }
                    failed = true;
                }
            }
        }

        let entries = log.entries().to_vec();
        Ok(CheckReport {
            section: options.section.clone(),
            documents: documents.iter().map(|d| d.filename().to_path_buf()).collect(),
            matches,
            validations,
            stats: entries_to_stats(&entries),
            log: entries,
            failed,
            generated_at: Utc::now(),
        })
    }

    /// Extract a single document leniently, for quick inspection.
    pub fn inspect(
        path: &Path,
        sink: &mut dyn LogSink,
    ) -> Result<crate::parser::schema::Schema, DataModelError> {
        let section = path.parent().unwrap_or_else(|| Path::new("."));
        crate::catalog::DocumentModel::new(path, section).extract_metadata(false, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_each_severity() {
        let entries = vec![
            LogEntry::new(Severity::Warning, "a"),
            LogEntry::new(Severity::Warning, "b"),
            LogEntry::new(Severity::Critical, "c"),
            LogEntry::new(Severity::Info, "d"),
        ];
        assert_eq!(
            entries_to_stats(&entries),
            CheckStats {
                critical: 1,
                warning: 2,
                info: 1,
            }
        );
    }

    #[test]
    fn defect_errors_display_verbatim() {
        let e = DataModelError::Model("HDU 1 in x.rst has no EXTNAME!".to_string());
        assert_eq!(e.to_string(), "HDU 1 in x.rst has no EXTNAME!");
        assert!(e.is_defect());
        let e = DataModelError::Fits {
            path: PathBuf::from("a.fits"),
            reason: "truncated header block".to_string(),
        };
        assert_eq!(e.to_string(), "Malformed FITS file a.fits: truncated header block");
        assert!(!e.is_defect());
    }

    #[test]
    fn missing_section_is_io_error() {
        let options = CheckOptions {
            section: PathBuf::from("/definitely/not/here"),
            ..CheckOptions::default()
        };
        assert!(matches!(ModelChecker::run(&options), Err(DataModelError::Io(_))));
    }
}
