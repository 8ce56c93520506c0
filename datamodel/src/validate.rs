//! Structural comparison of a documented schema with its prototype file.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::catalog::DocumentModel;
use crate::core::DataModelError;
use crate::log::{defect, LogSink, Severity};
use crate::parser::schema::{Schema, SectionSchema};

/// Source of the real structure of a file, in the same shape as a
/// documented [`Schema`].
pub trait MetadataReader {
    fn read_structure(&self, path: &Path) -> Result<Schema, DataModelError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum DiscrepancyKind {
    SectionCount,
    MissingExtname,
    ExtnameLookup,
    ExtensionType,
    UndocumentedExtname,
    ExtnameMismatch,
    MissingKeywords,
    ExtraKeywords,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub section: Option<usize>,
    pub documented: String,
    pub actual: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub document: PathBuf,
    pub prototype: Option<PathBuf>,
    pub discrepancies: Vec<Discrepancy>,
    /// Message of the strict-mode error that stopped this document.
    pub aborted: Option<String>,
}

impl ValidationReport {
    fn new(document: &Path, prototype: Option<PathBuf>) -> Self {
        Self {
            document: document.to_path_buf(),
            prototype,
            discrepancies: Vec::new(),
            aborted: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty() && self.aborted.is_none()
    }

    pub fn kinds(&self) -> Vec<DiscrepancyKind> {
        self.discrepancies.iter().map(|d| d.kind).collect()
    }
}

/// Records findings in the report and the log as they are made.
struct Comparison<'a> {
    report: ValidationReport,
    strict: bool,
    sink: &'a mut dyn LogSink,
}

impl Comparison<'_> {
    /// Structural finding: raised in strict mode, logged otherwise.
    fn structural(
        &mut self,
        kind: DiscrepancyKind,
        section: Option<usize>,
        documented: String,
        actual: String,
        message: String,
    ) -> Result<(), DataModelError> {
        let severity = if self.strict {
            Severity::Critical
        } else {
            Severity::Warning
        };
        self.push(kind, section, documented, actual, severity, message.clone());
        defect(self.sink, self.strict, message, DataModelError::Model)
    }

    /// Advisory finding: always logged, never raised.
    fn advisory(
        &mut self,
        kind: DiscrepancyKind,
        section: Option<usize>,
        documented: String,
        actual: String,
        message: String,
    ) {
        self.push(kind, section, documented, actual, Severity::Warning, message.clone());
        self.sink.warning(message);
    }

    fn push(
        &mut self,
        kind: DiscrepancyKind,
        section: Option<usize>,
        documented: String,
        actual: String,
        severity: Severity,
        message: String,
    ) {
        self.report.discrepancies.push(Discrepancy {
            kind,
            section,
            documented,
            actual,
            severity,
            message,
        });
    }
}

/// Compare a document's schema with the structure of its prototype.
///
/// Without a prototype there is nothing to compare and the report is empty.
/// In strict mode the first structural finding is returned as the error.
pub fn validate_prototype(
    document: &mut DocumentModel,
    reader: &dyn MetadataReader,
    strict: bool,
    sink: &mut dyn LogSink,
) -> Result<ValidationReport, DataModelError> {
    let (report, outcome) = compare_prototype(document, reader, strict, sink);
    outcome.map(|()| report)
}

/// The report holds every finding made before an error stopped the
/// comparison.
fn compare_prototype(
    document: &mut DocumentModel,
    reader: &dyn MetadataReader,
    strict: bool,
    sink: &mut dyn LogSink,
) -> (ValidationReport, Result<(), DataModelError>) {
    let model_path = document.filename().to_path_buf();
    let report = ValidationReport::new(&model_path, document.prototype.clone());
    let Some(prototype) = document.prototype.clone() else {
        return (report, Ok(()));
    };
    sink.info(format!(
        "Comparing {} to {}.",
        prototype.display(),
        model_path.display()
    ));
    let documented = match document.extract_metadata(strict, sink) {
        Ok(schema) => schema,
        Err(e) => return (report, Err(e)),
    };
    let actual = match reader.read_structure(&prototype) {
        Ok(schema) => schema,
        Err(e) => return (report, Err(e)),
    };

    let mut cmp = Comparison {
        report,
        strict,
        sink,
    };
    let outcome = compare_sections(
        &mut cmp,
        &documented,
        &actual,
        &prototype.display().to_string(),
        &model_path.display().to_string(),
    );
    (cmp.report, outcome)
}

fn compare_sections(
    cmp: &mut Comparison<'_>,
    documented: &Schema,
    actual: &Schema,
    proto: &str,
    model: &str,
) -> Result<(), DataModelError> {
    if actual.len() != documented.len() {
        cmp.structural(
            DiscrepancyKind::SectionCount,
            None,
            documented.len().to_string(),
            actual.len().to_string(),
            format!(
                "Prototype file {} has the wrong number of sections (HDUs) according to {}.",
                proto, model
            ),
        )?;
        return Ok(());
    }

    for real in actual.iter() {
        let i = real.number;
        if real.extname.is_none() {
            cmp.structural(
                DiscrepancyKind::MissingExtname,
                Some(i),
                documented.section(i).map(|s| s.key().to_string()).unwrap_or_default(),
                String::new(),
                format!("Prototype file {} has no EXTNAME in HDU{}.", proto, i),
            )?;
        }

        let Some(doc) = lookup(documented, real, cmp, model) else {
            continue;
        };

        if doc.extension() != real.extension() {
            cmp.structural(
                DiscrepancyKind::ExtensionType,
                Some(i),
                doc.extension().to_string(),
                real.extension().to_string(),
                format!(
                    "Prototype file {} has an extension type mismatch in HDU{} ({} != {}) according to {}.",
                    proto,
                    i,
                    real.extension(),
                    doc.extension(),
                    model
                ),
            )?;
        }

        match (doc.extname.as_deref(), real.extname.as_deref()) {
            (None, Some(actual_name)) => cmp.structural(
                DiscrepancyKind::UndocumentedExtname,
                Some(i),
                String::new(),
                actual_name.to_string(),
                format!("Data model {} has no EXTNAME in HDU{}.", model, i),
            )?,
            (Some(doc_name), Some(actual_name)) if doc_name != actual_name => cmp.structural(
                DiscrepancyKind::ExtnameMismatch,
                Some(i),
                doc_name.to_string(),
                actual_name.to_string(),
                format!(
                    "Prototype file {} has an EXTNAME mismatch in HDU{} ({} != {}) according to {}.",
                    proto, i, actual_name, doc_name, model
                ),
            )?,
            _ => {}
        }

        let doc_keywords: BTreeSet<&str> = doc.keyword_names().collect();
        let real_keywords: BTreeSet<&str> = real.keyword_names().collect();
        let missing: BTreeSet<&str> = doc_keywords.difference(&real_keywords).copied().collect();
        let extra: BTreeSet<&str> = real_keywords.difference(&doc_keywords).copied().collect();
        if !missing.is_empty() {
            cmp.advisory(
                DiscrepancyKind::MissingKeywords,
                Some(i),
                python_set(&missing),
                String::new(),
                format!(
                    "File {} HDU{} missing keywords according to {}: {}",
                    proto,
                    i,
                    model,
                    python_set(&missing)
                ),
            );
        }
        if !extra.is_empty() {
            cmp.advisory(
                DiscrepancyKind::ExtraKeywords,
                Some(i),
                String::new(),
                python_set(&extra),
                format!(
                    "File {} HDU{} extra keywords according to {}: {}",
                    proto,
                    i,
                    model,
                    python_set(&extra)
                ),
            );
        }
    }
    Ok(())
}

/// Documented section for a real one: by EXTNAME, else by HDU number.
fn lookup<'s>(
    documented: &'s Schema,
    real: &SectionSchema,
    cmp: &mut Comparison<'_>,
    model: &str,
) -> Option<&'s SectionSchema> {
    if let Some(found) = documented.get(real.key()) {
        return Some(found);
    }
    cmp.advisory(
        DiscrepancyKind::ExtnameLookup,
        Some(real.number),
        String::new(),
        real.key().to_string(),
        format!(
            "Could not find EXTNAME = '{}' in {}; trying by HDU number.",
            real.key(),
            model
        ),
    );
    documented.section(real.number)
}

/// Validate every document that has a prototype.
///
/// A strict-mode error stops only the document it came from; it is kept in
/// that document's report.
pub fn validate_prototypes(
    documents: &mut [DocumentModel],
    reader: &dyn MetadataReader,
    strict: bool,
    sink: &mut dyn LogSink,
) -> Vec<ValidationReport> {
    let mut reports = Vec::with_capacity(documents.len());
    for document in documents.iter_mut() {
        let (mut report, outcome) = compare_prototype(document, reader, strict, sink);
        if let Err(e) = outcome {
            if !e.is_defect() {
                sink.critical(e.to_string());
            }
            report.aborted = Some(e.to_string());
        }
        reports.push(report);
    }
    reports
}

/// `{'A', 'B'}`
fn python_set(names: &BTreeSet<&str>) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("{{{}}}", quoted.join(", "))
}
