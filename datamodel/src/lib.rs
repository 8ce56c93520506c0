//! datamodel - check data model documentation against FITS files
//!
//! A data model is a tree of reStructuredText documents, one per file type.
//! Each document declares a filename regex and describes every HDU of the
//! file in `Required Header Keywords` and `Required Data Table Columns`
//! tables. This library extracts those tables into a [`Schema`], matches
//! documents to real files and compares each schema with a prototype file.
//!
//! # Quick Start
//!
//! ```no_run
//! use datamodel::{CheckOptions, ModelChecker};
//! use std::path::PathBuf;
//!
//! let options = CheckOptions {
//!     section: PathBuf::from("doc/DESI_SPECTRO_DATA"),
//!     directory: PathBuf::from("/data/spectro"),
//!     compare_files: true,
//!     strict: false,
//! };
//! let report = ModelChecker::run(&options).unwrap();
//!
//! for entry in &report.log {
//!     println!("{:?}: {}", entry.severity, entry.message);
//! }
//! ```

pub mod catalog;
pub mod core;
pub mod log;
pub mod matcher;
pub mod parser;
pub mod units;
pub mod validate;

// Re-export main types
pub use catalog::{scan_model, DocumentModel};
pub use crate::core::{CheckOptions, CheckReport, CheckStats, DataModelError, ModelChecker};
pub use log::{LogEntry, LogSink, MemoryLog, Severity, TracingLog};
pub use matcher::{collect_files, files_to_regexp, MatchResult};
pub use parser::fits::FitsReader;
pub use parser::pattern::FilePattern;
pub use parser::schema::{
    ColumnEntry, ExtensionType, KeywordEntry, Schema, SectionData, SectionSchema,
};
pub use units::UnitVocabulary;
pub use validate::{
    validate_prototype, validate_prototypes, Discrepancy, DiscrepancyKind, MetadataReader,
    ValidationReport,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CheckOptions, CheckReport, DataModelError, DocumentModel, LogSink, MemoryLog,
        MetadataReader, ModelChecker, Schema, Severity,
    };
}
