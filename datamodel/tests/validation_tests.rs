//! Tests for prototype validation

mod common;

use common::*;
use datamodel::prelude::*;
use datamodel::{
    validate_prototype, validate_prototypes, DiscrepancyKind, ExtensionType, FitsReader,
    KeywordEntry, SectionData, ValidationReport,
};

fn proto() -> String {
    fits_file_prototype().display().to_string()
}

fn model() -> String {
    fixture_path("t/fits_file.rst").display().to_string()
}

/// The fixture document with its prototype set, validated against `actual`.
fn validate(
    actual: Schema,
    strict: bool,
    log: &mut MemoryLog,
) -> Result<ValidationReport, DataModelError> {
    let mut document = fits_file_model();
    document.prototype = Some(fits_file_prototype());
    validate_prototype(&mut document, &StaticReader(actual), strict, log)
}

#[test]
fn test_validate_prototype_matching() {
    let mut log = MemoryLog::new();
    let report = validate(documented_schema(), true, &mut log).unwrap();
    assert!(report.is_clean(), "unexpected: {:?}", report.discrepancies);
    assert!(log.contains(&format!("Comparing {} to {}.", proto(), model())));
}

#[test]
fn test_validate_prototype_no_prototype() {
    let mut log = MemoryLog::new();
    let mut document = fits_file_model();
    document.prototype = None;
    let report =
        validate_prototype(&mut document, &StaticReader(Schema::new()), true, &mut log).unwrap();
    assert!(report.is_clean());
    assert!(report.prototype.is_none());
    assert!(log.is_empty());
}

#[test]
fn test_validate_prototype_hdu_mismatch() {
    let mut actual = documented_schema();
    let extra = actual.section(1).unwrap().clone();
    actual.push(extra);
    let expected = format!(
        "Prototype file {} has the wrong number of sections (HDUs) according to {}.",
        proto(),
        model()
    );

    let mut log = MemoryLog::new();
    let report = validate(actual.clone(), false, &mut log).unwrap();
    assert_eq!(report.kinds(), vec![DiscrepancyKind::SectionCount]);
    assert_eq!(report.discrepancies[0].documented, "2");
    assert_eq!(report.discrepancies[0].actual, "3");
    assert_eq!(log.recent(1), Some(expected.as_str()));

    let err = validate(actual, true, &mut log).unwrap_err();
    assert_eq!(err.to_string(), expected);
    assert_eq!(log.recent(1), Some(expected.as_str()));
}

#[test]
fn test_validate_prototype_hdu_keyword_mismatch() {
    let mut actual = documented_schema();
    actual
        .section_mut(0)
        .unwrap()
        .keywords
        .push(KeywordEntry::new("BUNIT", "erg", "str", "This is a test."));

    let mut log = MemoryLog::new();
    let report = validate(actual, true, &mut log).unwrap();
    assert_eq!(report.kinds(), vec![DiscrepancyKind::ExtraKeywords]);
    assert_eq!(
        log.recent(1),
        Some(
            format!(
                "File {} HDU0 extra keywords according to {}: {{'BUNIT'}}",
                proto(),
                model()
            )
            .as_str()
        )
    );
}

#[test]
fn test_validate_prototype_hdu_wrong_keyword() {
    let mut actual = documented_schema();
    let section = actual.section_mut(0).unwrap();
    let bzero = section
        .keywords
        .iter()
        .position(|k| k.name == "BZERO")
        .unwrap();
    section.keywords[bzero] = KeywordEntry::new("BUNIT", "erg", "str", "This is a test.");

    let mut log = MemoryLog::new();
    validate(actual, true, &mut log).unwrap();
    assert_eq!(
        log.recent(2),
        Some(
            format!(
                "File {} HDU0 missing keywords according to {}: {{'BZERO'}}",
                proto(),
                model()
            )
            .as_str()
        )
    );
    assert_eq!(
        log.recent(1),
        Some(
            format!(
                "File {} HDU0 extra keywords according to {}: {{'BUNIT'}}",
                proto(),
                model()
            )
            .as_str()
        )
    );
}

#[test]
fn test_validate_prototype_hdu_extension_type() {
    let mut actual = documented_schema();
    actual.section_mut(1).unwrap().data = SectionData::Image {
        format: "Data: FITS image [int16, 32x3]".to_string(),
    };
    let expected = format!(
        "Prototype file {} has an extension type mismatch in HDU1 (IMAGE != BINTABLE) according to {}.",
        proto(),
        model()
    );

    let mut log = MemoryLog::new();
    let report = validate(actual.clone(), false, &mut log).unwrap();
    assert_eq!(report.kinds(), vec![DiscrepancyKind::ExtensionType]);
    assert_eq!(report.discrepancies[0].documented, ExtensionType::BinTable.to_string());
    assert_eq!(log.recent(1), Some(expected.as_str()));

    let err = validate(actual, true, &mut log).unwrap_err();
    assert!(matches!(err, DataModelError::Model(_)));
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_validate_prototype_hdu_extension_name() {
    let mut actual = documented_schema();
    actual.section_mut(1).unwrap().extname = Some("GALAXY".to_string());
    let mismatch = format!(
        "Prototype file {} has an EXTNAME mismatch in HDU1 (GALAXY != Galaxies) according to {}.",
        proto(),
        model()
    );

    let mut log = MemoryLog::new();
    let err = validate(actual.clone(), true, &mut log).unwrap_err();
    assert_eq!(err.to_string(), mismatch);
    assert_eq!(log.recent(1), Some(mismatch.as_str()));
    assert_eq!(
        log.recent(2),
        Some(
            format!(
                "Could not find EXTNAME = 'GALAXY' in {}; trying by HDU number.",
                model()
            )
            .as_str()
        )
    );

    actual.section_mut(1).unwrap().extname = None;
    let report = validate(actual, false, &mut log).unwrap();
    assert_eq!(
        report.kinds(),
        vec![DiscrepancyKind::MissingExtname, DiscrepancyKind::ExtnameLookup]
    );
    assert_eq!(
        log.recent(2),
        Some(format!("Prototype file {} has no EXTNAME in HDU1.", proto()).as_str())
    );
    assert_eq!(
        log.recent(1),
        Some(
            format!(
                "Could not find EXTNAME = '' in {}; trying by HDU number.",
                model()
            )
            .as_str()
        )
    );
}

#[test]
fn test_validate_prototype_undocumented_extname() {
    let mut actual = documented_schema();
    let mut document = edited_fits_file_model(|text| text.replace("EXTNAME = Galaxies\n", "\n"));
    document.prototype = Some(fits_file_prototype());
    actual.section_mut(1).unwrap().extname = Some("Galaxies".to_string());

    let mut log = MemoryLog::new();
    let report =
        validate_prototype(&mut document, &StaticReader(actual), false, &mut log).unwrap();
    assert!(report
        .kinds()
        .contains(&DiscrepancyKind::UndocumentedExtname));
    assert!(log.contains(&format!(
        "Data model {} has no EXTNAME in HDU1.",
        model()
    )));
}

#[test]
fn test_validate_prototypes_keeps_going() {
    let mut actual = documented_schema();
    actual.section_mut(1).unwrap().extname = Some("GALAXY".to_string());

    let mut first = fits_file_model();
    first.prototype = Some(fits_file_prototype());
    let mut second = fits_file_model();
    second.prototype = Some(fits_file_prototype());
    let mut documents = vec![first, second];

    let mut log = MemoryLog::new();
    let reports = validate_prototypes(&mut documents, &StaticReader(actual), true, &mut log);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.aborted.is_some()));
    assert!(reports[0]
        .aborted
        .as_deref()
        .unwrap()
        .contains("EXTNAME mismatch in HDU1"));
}

#[test]
fn test_validate_prototypes_keeps_partial_findings() {
    let mut actual = documented_schema();
    actual
        .section_mut(0)
        .unwrap()
        .keywords
        .push(KeywordEntry::new("BUNIT", "erg", "str", "This is a test."));
    actual.section_mut(1).unwrap().extname = Some("GALAXY".to_string());

    let mut document = fits_file_model();
    document.prototype = Some(fits_file_prototype());
    let mut documents = vec![document];

    let mut log = MemoryLog::new();
    let reports = validate_prototypes(&mut documents, &StaticReader(actual), true, &mut log);
    assert_eq!(
        reports[0].kinds(),
        vec![
            DiscrepancyKind::ExtraKeywords,
            DiscrepancyKind::ExtnameLookup,
            DiscrepancyKind::ExtnameMismatch
        ]
    );
    assert!(reports[0].aborted.is_some());
}

#[test]
fn test_validate_real_fits_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fits_file.fits");
    write_fits_file(&path);

    let reader = FitsReader::new();
    let actual = reader.read_schema(&path).unwrap();
    assert_eq!(actual.len(), 2);
    let primary = actual.section(0).unwrap();
    assert_eq!(primary.extname.as_deref(), Some("PRIMARY"));
    assert_eq!(
        primary.image_format(),
        Some("Data: FITS image [int16, 100x100]")
    );
    assert_eq!(
        primary.keyword("BZERO").unwrap().as_tuple(),
        ("BZERO", "32768", "int", "Data are really unsigned 16-bit int.")
    );
    let galaxies = actual.get("Galaxies").unwrap();
    assert_eq!(galaxies.extension(), ExtensionType::BinTable);
    let columns: Vec<_> = galaxies
        .columns()
        .iter()
        .map(|c| (c.name.as_str(), c.type_tag.as_str(), c.unit.as_str()))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("target", "char[20]", ""),
            ("V_mag", "float32", "mag"),
            ("vdisp", "float64", "km/s"),
        ]
    );

    let mut document = fits_file_model();
    document.prototype = Some(path);
    let mut log = MemoryLog::new();
    let report = validate_prototype(&mut document, &reader, true, &mut log).unwrap();
    assert!(report.is_clean(), "unexpected: {:?}", report.discrepancies);
}

#[test]
fn test_truncated_fits_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.fits");
    std::fs::write(&path, &fits_file_bytes()[..1000]).unwrap();
    let err = FitsReader::new().read_schema(&path).unwrap_err();
    assert!(matches!(err, DataModelError::Fits { .. }));
}

#[test]
fn test_oversized_fits_header_is_an_error() {
    let mut header: String = [
        "SIMPLE  =                    T",
        "BITPIX  =                  -64",
        "NAXIS   =                    2",
        "NAXIS1  =         100000000000",
        "NAXIS2  =         100000000000",
        "END",
    ]
    .iter()
    .map(|card| format!("{:<80}", card))
    .collect();
    while header.len() % 2880 != 0 {
        header.push(' ');
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.fits");
    std::fs::write(&path, header).unwrap();

    let err = FitsReader::new().read_schema(&path).unwrap_err();
    assert!(matches!(err, DataModelError::Fits { .. }));
    assert!(err.to_string().contains("data unit size overflows"));
}
