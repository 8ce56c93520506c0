//! FITS header reader.
//!
//! Only headers are decoded: each HDU is a sequence of 2880-byte blocks of
//! 80-character cards ending with `END`, followed by a data unit whose size
//! follows from BITPIX, NAXISn, PCOUNT and GCOUNT. Data units are skipped.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::core::DataModelError;
use crate::parser::schema::{
    ColumnEntry, ExtensionType, KeywordEntry, Schema, SectionData, SectionSchema,
};
use crate::validate::MetadataReader;

pub const BLOCK_SIZE: usize = 2880;
pub const CARD_SIZE: usize = 80;
const MAX_NAXIS: i64 = 999;

/// Cards describing the file layout rather than its content.
const STRUCTURAL: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "EXTEND", "XTENSION", "PCOUNT", "GCOUNT", "TFIELDS", "COMMENT",
    "HISTORY", "CONTINUE", "END", "",
];
const INDEXED_STRUCTURAL: &[&str] = &[
    "TTYPE", "TFORM", "TUNIT", "TDIM", "TNULL", "TSCAL", "TZERO", "TDISP",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    Str(String),
    Logical(bool),
    Int(i64),
    Float(String),
    Other(String),
}

impl CardValue {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw {
            "T" => return CardValue::Logical(true),
            "F" => return CardValue::Logical(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return CardValue::Int(n);
        }
        if raw.replace(['D', 'd'], "E").parse::<f64>().is_ok() {
            return CardValue::Float(raw.to_string());
        }
        CardValue::Other(raw.to_string())
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            CardValue::Str(_) | CardValue::Other(_) => "str",
            CardValue::Logical(_) => "bool",
            CardValue::Int(_) => "int",
            CardValue::Float(_) => "float",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CardValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CardValue::Str(s) | CardValue::Float(s) | CardValue::Other(s) => s.clone(),
            CardValue::Logical(true) => "T".to_string(),
            CardValue::Logical(false) => "F".to_string(),
            CardValue::Int(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Option<CardValue>,
    pub comment: String,
}

impl Card {
    pub fn parse(raw: &str) -> Self {
        let keyword = raw.get(..8).unwrap_or(raw).trim().to_string();
        if raw.get(8..10) != Some("= ") {
            return Self {
                keyword,
                value: None,
                comment: raw.get(8..).unwrap_or("").trim().to_string(),
            };
        }
        let rest = raw.get(10..).unwrap_or("").trim_start();
        let (value, comment) = if let Some(quoted) = rest.strip_prefix('\'') {
            let (text, after) = parse_quoted(quoted);
            (Some(CardValue::Str(text)), comment_of(after))
        } else {
            match rest.split_once('/') {
                Some((v, c)) => (non_empty_value(v), c.trim().to_string()),
                None => (non_empty_value(rest), String::new()),
            }
        };
        Self {
            keyword,
            value,
            comment,
        }
    }
}

fn non_empty_value(raw: &str) -> Option<CardValue> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(CardValue::parse(raw))
    }
}

/// Split `text` (after the opening quote) into the string value, with `''`
/// unescaped and trailing blanks dropped, and whatever follows the closing
/// quote.
fn parse_quoted(text: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                value.push('\'');
                chars.next();
                continue;
            }
            return (value.trim_end().to_string(), &text[i + 1..]);
        }
        value.push(c);
    }
    (value.trim_end().to_string(), "")
}

fn comment_of(after: &str) -> String {
    after
        .trim_start()
        .strip_prefix('/')
        .map(|c| c.trim().to_string())
        .unwrap_or_default()
}

/// One decoded header.
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub cards: Vec<Card>,
}

impl Header {
    pub fn get(&self, keyword: &str) -> Option<&CardValue> {
        self.cards
            .iter()
            .find(|c| c.keyword == keyword)
            .and_then(|c| c.value.as_ref())
    }

    pub fn int(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(CardValue::as_int)
    }

    pub fn text(&self, keyword: &str) -> Option<String> {
        self.get(keyword).map(CardValue::as_text)
    }

    fn axes(&self) -> Result<Vec<i64>, String> {
        let naxis = self.int("NAXIS").unwrap_or(0);
        if !(0..=MAX_NAXIS).contains(&naxis) {
            return Err(format!("NAXIS = {} out of range", naxis));
        }
        (1..=naxis)
            .map(|n| match self.int(&format!("NAXIS{}", n)).unwrap_or(0) {
                len if len < 0 => Err(format!("NAXIS{} = {} is negative", n, len)),
                len => Ok(len),
            })
            .collect()
    }

    /// Size in bytes of the data unit, before padding.
    fn data_size(&self) -> Result<u64, String> {
        let axes = self.axes()?;
        if axes.is_empty() {
            return Ok(0);
        }
        let overflow = || "data unit size overflows".to_string();
        let bitpix = self.int("BITPIX").unwrap_or(8).unsigned_abs();
        let pcount = self.int("PCOUNT").unwrap_or(0).max(0).unsigned_abs();
        let gcount = self.int("GCOUNT").unwrap_or(1).max(1).unsigned_abs();
        let elements = axes
            .iter()
            .try_fold(1u64, |acc, &n| acc.checked_mul(n.unsigned_abs()))
            .ok_or_else(overflow)?;
        pcount
            .checked_add(elements)
            .and_then(|n| n.checked_mul(gcount))
            .and_then(|n| n.checked_mul(bitpix / 8))
            .ok_or_else(overflow)
    }
}

fn is_structural(keyword: &str) -> bool {
    if STRUCTURAL.contains(&keyword) {
        return true;
    }
    INDEXED_STRUCTURAL.iter().any(|prefix| {
        keyword
            .strip_prefix(prefix)
            .map_or(false, |n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    })
}

fn padded(size: u64) -> Option<u64> {
    let block = BLOCK_SIZE as u64;
    size.div_ceil(block).checked_mul(block)
}

/// Type tag of a binary table TFORM, e.g. `20A` -> `char[20]`, `E` -> `float32`.
pub fn tform_type(tform: &str) -> String {
    let tform = tform.trim();
    let digits: String = tform.chars().take_while(|c| c.is_ascii_digit()).collect();
    let repeat: usize = digits.parse().unwrap_or(1);
    let code = tform[digits.len()..].chars().next();
    let base = match code {
        Some('A') => return format!("char[{}]", repeat),
        Some('L') => "bool",
        Some('X') => "bit",
        Some('B') => "uint8",
        Some('I') => "int16",
        Some('J') => "int32",
        Some('K') => "int64",
        Some('E') => "float32",
        Some('D') => "float64",
        Some('C') => "complex64",
        Some('M') => "complex128",
        Some('P') | Some('Q') => "varray",
        _ => return tform.to_string(),
    };
    if repeat == 1 {
        base.to_string()
    } else {
        format!("{}[{}]", base, repeat)
    }
}

/// Type tag of an ASCII table TFORM, e.g. `A20` -> `char[20]`, `F8.3` -> `float64`.
pub fn ascii_tform_type(tform: &str) -> String {
    let tform = tform.trim();
    let mut chars = tform.chars();
    let code = chars.next();
    let width: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    match code {
        Some('A') => format!("char[{}]", width.parse::<usize>().unwrap_or(1)),
        Some('I') => "int32".to_string(),
        Some('F') | Some('E') | Some('D') => "float64".to_string(),
        _ => tform.to_string(),
    }
}

fn bitpix_type(bitpix: i64) -> String {
    match bitpix {
        8 => "uint8".to_string(),
        16 => "int16".to_string(),
        32 => "int32".to_string(),
        64 => "int64".to_string(),
        -32 => "float32".to_string(),
        -64 => "float64".to_string(),
        other => format!("BITPIX={}", other),
    }
}

/// Reads FITS files into the schema shape used by data model documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct FitsReader;

impl FitsReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_headers(&self, path: &Path) -> Result<Vec<Header>, DataModelError> {
        let mut file = BufReader::new(File::open(path)?);
        let mut headers = Vec::new();
        while let Some(header) = read_header(&mut file, path, headers.is_empty())? {
            let skip = header
                .data_size()
                .map_err(|reason| fits_error(path, reason))?;
            let skip = padded(skip)
                .and_then(|n| i64::try_from(n).ok())
                .ok_or_else(|| fits_error(path, "data unit size overflows"))?;
            if skip > 0 {
                file.seek(SeekFrom::Current(skip))?;
            }
            headers.push(header);
        }
        if headers.is_empty() {
            return Err(fits_error(path, "no primary header"));
        }
        Ok(headers)
    }

    pub fn read_schema(&self, path: &Path) -> Result<Schema, DataModelError> {
        let mut schema = Schema::new();
        for (i, header) in self.read_headers(path)?.iter().enumerate() {
            schema.push(section_from_header(i, header, path)?);
        }
        Ok(schema)
    }
}

impl MetadataReader for FitsReader {
    fn read_structure(&self, path: &Path) -> Result<Schema, DataModelError> {
        self.read_schema(path)
    }
}

fn fits_error(path: &Path, reason: impl Into<String>) -> DataModelError {
    DataModelError::Fits {
        path: PathBuf::from(path),
        reason: reason.into(),
    }
}

/// Read one header. `Ok(None)` at a clean end of file.
fn read_header<R: Read>(
    input: &mut R,
    path: &Path,
    primary: bool,
) -> Result<Option<Header>, DataModelError> {
    let mut header = Header::default();
    let mut block = vec![0u8; BLOCK_SIZE];
    let mut first = true;
    loop {
        let filled = fill_block(input, &mut block)?;
        if filled == 0 && first {
            return Ok(None);
        }
        if filled < BLOCK_SIZE {
            return Err(fits_error(path, "truncated header block"));
        }
        if first {
            let lead = if primary { b"SIMPLE  ".as_slice() } else { b"XTENSION".as_slice() };
            if &block[..8] != lead {
                if primary {
                    return Err(fits_error(path, "missing SIMPLE card"));
                }
                // Trailing bytes after the last HDU are tolerated.
                return Ok(None);
            }
            first = false;
        }
        for raw in block.chunks(CARD_SIZE) {
            let text = String::from_utf8_lossy(raw);
            let card = Card::parse(&text);
            if card.keyword == "END" {
                return Ok(Some(header));
            }
            header.cards.push(card);
        }
    }
}

fn fill_block<R: Read>(input: &mut R, block: &mut [u8]) -> Result<usize, DataModelError> {
    let mut filled = 0;
    while filled < block.len() {
        let n = input.read(&mut block[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

fn section_from_header(
    i: usize,
    header: &Header,
    path: &Path,
) -> Result<SectionSchema, DataModelError> {
    let kind = match header.text("XTENSION") {
        None => ExtensionType::Image,
        Some(x) => ExtensionType::from_xtension(&x)
            .ok_or_else(|| fits_error(path, format!("unsupported XTENSION '{}' in HDU{}", x, i)))?,
    };

    let keywords = header
        .cards
        .iter()
        .filter(|c| !is_structural(&c.keyword))
        .map(|c| {
            let (value, type_tag) = match &c.value {
                Some(v) => (v.as_text(), v.type_tag()),
                None => (String::new(), "str"),
            };
            KeywordEntry::new(c.keyword.clone(), value, type_tag, c.comment.clone())
        })
        .collect();

    let data = match kind {
        ExtensionType::Image => SectionData::Image {
            format: image_format(header),
        },
        ExtensionType::Table | ExtensionType::BinTable => {
            let nfields = header.int("TFIELDS").unwrap_or(0).max(0);
            let columns = (1..=nfields)
                .map(|n| {
                    ColumnEntry::new(
                        header.text(&format!("TTYPE{}", n)).unwrap_or_default(),
                        header
                            .text(&format!("TFORM{}", n))
                            .map(|f| match kind {
                                ExtensionType::Table => ascii_tform_type(&f),
                                _ => tform_type(&f),
                            })
                            .unwrap_or_default(),
                        header.text(&format!("TUNIT{}", n)).unwrap_or_default(),
                        String::new(),
                    )
                })
                .collect();
            SectionData::Table { kind, columns }
        }
    };

    Ok(SectionSchema {
        title: format!("HDU{}", i),
        number: i,
        extname: header.text("EXTNAME").filter(|n| !n.is_empty()),
        keywords,
        data,
    })
}

fn image_format(header: &Header) -> String {
    let axes = header.axes().unwrap_or_default();
    if axes.is_empty() {
        return "Empty HDU.".to_string();
    }
    let dims: Vec<String> = axes.iter().map(|n| n.to_string()).collect();
    format!(
        "Data: FITS image [{}, {}]",
        bitpix_type(header.int("BITPIX").unwrap_or(8)),
        dims.join("x")
    )
}
