//! Helpers shared by the integration tests.

#![allow(dead_code)]

use datamodel::{DataModelError, DocumentModel, MemoryLog, MetadataReader, Schema};
use std::fs;
use std::path::{Path, PathBuf};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// The `t/fits_file.rst` document, read from disk.
pub fn fits_file_model() -> DocumentModel {
    let path = fixture_path("t/fits_file.rst");
    let dir = fixture_path("t");
    DocumentModel::new(path, dir)
}

/// The `t/fits_file.rst` document with its text passed through `edit`.
pub fn edited_fits_file_model(edit: impl FnOnce(String) -> String) -> DocumentModel {
    let path = fixture_path("t/fits_file.rst");
    let text = fs::read_to_string(&path).unwrap();
    DocumentModel::from_text(path, fixture_path("t"), edit(text))
}

/// Where the prototype of `t/fits_file.rst` would live next to it.
pub fn fits_file_prototype() -> PathBuf {
    fixture_path("t/fits_file.fits")
}

/// The documented schema of `t/fits_file.rst`.
pub fn documented_schema() -> Schema {
    let mut log = MemoryLog::new();
    fits_file_model().extract_metadata(false, &mut log).unwrap()
}

/// Reader that returns a fixed structure for any path.
pub struct StaticReader(pub Schema);

impl MetadataReader for StaticReader {
    fn read_structure(&self, _path: &Path) -> Result<Schema, DataModelError> {
        Ok(self.0.clone())
    }
}

fn value_card(key: &str, value: &str) -> String {
    format!("{:<8}= {:>20}", key, value)
}

fn string_card(key: &str, value: &str) -> String {
    format!("{:<8}= '{:<8}'", key, value)
}

fn commented(card: String, comment: &str) -> String {
    format!("{} / {}", card, comment)
}

fn push_header(out: &mut Vec<u8>, cards: &[String]) {
    let mut text = String::new();
    for card in cards {
        text.push_str(&format!("{:<80}", card));
    }
    text.push_str(&format!("{:<80}", "END"));
    while text.len() % 2880 != 0 {
        text.push(' ');
    }
    out.extend_from_slice(text.as_bytes());
}

fn push_data(out: &mut Vec<u8>, size: usize) {
    let padded = size.div_ceil(2880) * 2880;
    out.extend(std::iter::repeat(0u8).take(padded));
}

/// Bytes of a FITS file with the structure documented in `t/fits_file.rst`:
/// a 100x100 int16 primary image and a three-row `Galaxies` binary table.
pub fn fits_file_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    push_header(
        &mut out,
        &[
            value_card("SIMPLE", "T"),
            value_card("BITPIX", "16"),
            value_card("NAXIS", "2"),
            value_card("NAXIS1", "100"),
            value_card("NAXIS2", "100"),
            value_card("EXTEND", "T"),
            value_card("BSCALE", "1"),
            commented(
                value_card("BZERO", "32768"),
                "Data are really unsigned 16-bit int.",
            ),
            string_card("EXTNAME", "PRIMARY"),
        ],
    );
    push_data(&mut out, 100 * 100 * 2);
    push_header(
        &mut out,
        &[
            string_card("XTENSION", "BINTABLE"),
            value_card("BITPIX", "8"),
            value_card("NAXIS", "2"),
            commented(value_card("NAXIS1", "32"), "length of dimension 1"),
            commented(value_card("NAXIS2", "3"), "length of dimension 2"),
            value_card("PCOUNT", "0"),
            value_card("GCOUNT", "1"),
            value_card("TFIELDS", "3"),
            string_card("TTYPE1", "target"),
            string_card("TFORM1", "20A"),
            string_card("TTYPE2", "V_mag"),
            string_card("TFORM2", "E"),
            string_card("TUNIT2", "mag"),
            string_card("TTYPE3", "vdisp"),
            string_card("TFORM3", "D"),
            string_card("TUNIT3", "km/s"),
            string_card("EXTNAME", "Galaxies"),
        ],
    );
    push_data(&mut out, 32 * 3);
    out
}

pub fn write_fits_file(path: &Path) {
    fs::write(path, fits_file_bytes()).unwrap();
}
