//! Schema extraction from data model documents.
//!
//! A document describes each HDU in a block starting with a bare `HDUn`
//! title line. Inside a block the extractor looks for:
//!
//! - an `EXTNAME = NAME` line naming the HDU,
//! - `Empty HDU.` or a `Data: ...` line for image HDUs,
//! - a `Required Data Table Columns` table for binary tables,
//! - a `Required Header Keywords` table.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::core::DataModelError;
use crate::log::{defect, LogSink};
use crate::parser::schema::{
    ColumnEntry, ExtensionType, KeywordEntry, Schema, SectionData, SectionSchema,
};
use crate::parser::table::{field, parse_table};
use crate::units::{is_unit_keyword, UnitStatus, UnitVocabulary};

const KEYWORDS_HEADING: &str = "Required Header Keywords";
const COLUMNS_HEADING: &str = "Required Data Table Columns";
const EMPTY_HDU: &str = "Empty HDU.";
const EXTNAME_LINE: &str = "EXTNAME = ";

fn hdu_line() -> &'static Regex {
    static HDU: OnceLock<Regex> = OnceLock::new();
    HDU.get_or_init(|| Regex::new(r"^HDU\d+$").expect("static regex"))
}

/// Builds a [`Schema`] from the text of one document.
///
/// `path` is the document the text came from; it only appears in messages.
pub struct SchemaExtractor<'a> {
    path: &'a Path,
    strict: bool,
    units: UnitVocabulary,
}

impl<'a> SchemaExtractor<'a> {
    pub fn new(path: &'a Path, strict: bool) -> Self {
        Self {
            path,
            strict,
            units: UnitVocabulary::new(),
        }
    }

    pub fn extract(&self, text: &str, sink: &mut dyn LogSink) -> Result<Schema, DataModelError> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        let starts: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| hdu_line().is_match(l))
            .map(|(i, _)| i)
            .collect();

        let mut schema = Schema::new();
        for (k, start) in starts.iter().enumerate() {
            let end = starts.get(k + 1).copied().unwrap_or(lines.len());
            let section = self.extract_section(k, &lines[*start..end], sink)?;
            schema.push(section);
        }
        tracing::debug!(
            "Extracted {} sections from {}.",
            schema.len(),
            self.path.display()
        );
        Ok(schema)
    }

    fn extract_section(
        &self,
        k: usize,
        section: &[&str],
        sink: &mut dyn LogSink,
    ) -> Result<SectionSchema, DataModelError> {
        let title = section.first().map(|l| l.trim().to_string()).unwrap_or_default();

        let mut data = SectionData::Image {
            format: image_format(section),
        };
        if let Some(rdtc) = heading(section, COLUMNS_HEADING) {
            let columns = self.extract_table_columns(k, &section[rdtc..], sink)?;
            data = SectionData::Table {
                kind: ExtensionType::BinTable,
                columns,
            };
        }

        let keywords = match heading(section, KEYWORDS_HEADING) {
            Some(rhk) => self.extract_keywords(k, &section[rhk..], sink)?,
            None => Vec::new(),
        };
        let extname = section
            .iter()
            .find_map(|l| l.strip_prefix(EXTNAME_LINE))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        match extname.as_deref() {
            None => defect(
                sink,
                self.strict,
                format!("HDU {} in {} has no EXTNAME!", k, self.path.display()),
                DataModelError::Model,
            )?,
            Some("PRIMARY") if k == 0 => sink.warning(format!(
                "HDU {} in {} should have a more meaningful EXTNAME than 'PRIMARY'.",
                k,
                self.path.display()
            )),
            Some(_) => {}
        }

        Ok(SectionSchema {
            title,
            number: k,
            extname,
            keywords,
            data,
        })
    }

    fn extract_table_columns(
        &self,
        k: usize,
        lines: &[&str],
        sink: &mut dyn LogSink,
    ) -> Result<Vec<ColumnEntry>, DataModelError> {
        let Some(table) = parse_table(lines) else {
            tracing::debug!(
                "No column table under '{}' in HDU {} of {}.",
                COLUMNS_HEADING,
                k,
                self.path.display()
            );
            return Ok(Vec::new());
        };
        let mut columns = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let column = ColumnEntry::new(field(row, 0), field(row, 1), field(row, 2), field(row, 3));
            if column.type_tag.is_empty() {
                defect(
                    sink,
                    self.strict,
                    format!(
                        "Missing type for column {} in HDU {} of {}!",
                        column.name,
                        k,
                        self.path.display()
                    ),
                    DataModelError::Model,
                )?;
            }
            if !column.unit.is_empty() {
                self.check_unit(&column.unit, &column.name, "column", k, sink)?;
            }
            columns.push(column);
        }
        Ok(columns)
    }

    fn extract_keywords(
        &self,
        k: usize,
        lines: &[&str],
        sink: &mut dyn LogSink,
    ) -> Result<Vec<KeywordEntry>, DataModelError> {
        let Some(table) = parse_table(lines) else {
            return Ok(Vec::new());
        };
        let mut keywords = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let keyword =
                KeywordEntry::new(field(row, 0), field(row, 1), field(row, 2), field(row, 3));
            if keyword.type_tag.is_empty() {
                defect(
                    sink,
                    self.strict,
                    format!(
                        "Missing type for keyword {} in HDU {} of {}!",
                        keyword.name,
                        k,
                        self.path.display()
                    ),
                    DataModelError::Model,
                )?;
            }
            if is_unit_keyword(&keyword.name) && !keyword.value.is_empty() {
                self.check_unit(&keyword.value, &keyword.name, "keyword", k, sink)?;
            }
            keywords.push(keyword);
        }
        Ok(keywords)
    }

    fn check_unit(
        &self,
        unit: &str,
        owner: &str,
        what: &str,
        k: usize,
        sink: &mut dyn LogSink,
    ) -> Result<(), DataModelError> {
        match self.units.check(unit) {
            Ok(UnitStatus::Standard) => Ok(()),
            Ok(UnitStatus::Acceptable) => {
                tracing::debug!(
                    "Non-standard (but acceptable) unit {} detected for {} {} in HDU {} of {}.",
                    unit,
                    what,
                    owner,
                    k,
                    self.path.display()
                );
                Ok(())
            }
            Err(message) => defect(sink, self.strict, message, DataModelError::BadUnit),
        }
    }
}

fn heading(section: &[&str], title: &str) -> Option<usize> {
    section.iter().position(|l| l.trim() == title)
}

fn image_format(section: &[&str]) -> String {
    if section.iter().any(|l| l.trim() == EMPTY_HDU) {
        return EMPTY_HDU.to_string();
    }
    section
        .iter()
        .find(|l| l.starts_with("Data:"))
        .map(|l| l.trim().to_string())
        .unwrap_or_default()
}

/// Extract a schema from document text.
pub fn extract_schema(
    text: &str,
    path: &Path,
    strict: bool,
    sink: &mut dyn LogSink,
) -> Result<Schema, DataModelError> {
    SchemaExtractor::new(path, strict).extract(text, sink)
}
