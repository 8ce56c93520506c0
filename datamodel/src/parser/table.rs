//! reStructuredText simple tables.
//!
//! ```text
//! ======== ============= ==== =====================
//! KEY      Example Value Type Comment
//! ======== ============= ==== =====================
//! NAXIS1   32            int  length of dimension 1
//! ======== ============= ==== =====================
//! ```
//!
//! Fields are cut at the character positions given by the boundary row, never
//! split on whitespace, because free-text columns contain spaces.

use regex::Regex;
use std::sync::OnceLock;

fn boundary_regex() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"^=+( +=+)*\s*$").expect("static regex"))
}

pub fn is_boundary(line: &str) -> bool {
    boundary_regex().is_match(line)
}

/// Widths of the `=` runs of a boundary row.
pub fn column_widths(boundary: &str) -> Vec<usize> {
    boundary
        .split_whitespace()
        .map(|run| run.chars().count())
        .collect()
}

/// Cut `row` into one trimmed field per column.
///
/// Column `k` starts after the previous columns and one separator each. The
/// last field extends to the end of the row; missing trailing fields are
/// empty.
pub fn extract_columns(row: &str, widths: &[usize]) -> Vec<String> {
    let chars: Vec<char> = row.chars().collect();
    let mut fields = Vec::with_capacity(widths.len());
    let mut start = 0;
    for (k, width) in widths.iter().enumerate() {
        let end = if k + 1 == widths.len() {
            chars.len()
        } else {
            start + width
        };
        let field: String = if start < chars.len() {
            chars[start..end.min(chars.len())].iter().collect()
        } else {
            String::new()
        };
        fields.push(field.trim().to_string());
        start += width + 1;
    }
    fields
}

/// A parsed table: its column widths and the fields of every data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub widths: Vec<usize>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse the first table found in `lines`.
///
/// Returns `None` unless three boundary rows are present. Blank rows inside
/// the body are skipped.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> Option<Table> {
    let boundaries: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_boundary(l.as_ref()))
        .map(|(i, _)| i)
        .take(3)
        .collect();
    if boundaries.len() < 3 {
        return None;
    }
    let widths = column_widths(lines[boundaries[0]].as_ref());
    let header = lines[boundaries[0] + 1..boundaries[1]]
        .first()
        .map(|l| extract_columns(l.as_ref(), &widths))
        .unwrap_or_default();
    let rows = lines[boundaries[1] + 1..boundaries[2]]
        .iter()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty())
        .map(|l| extract_columns(l, &widths))
        .collect();
    Some(Table {
        widths,
        header,
        rows,
    })
}

/// Field `k` of a row, or empty when the table has fewer columns.
pub(crate) fn field(row: &[String], k: usize) -> String {
    row.get(k).cloned().unwrap_or_default()
}
