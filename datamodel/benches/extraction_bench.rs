use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datamodel::parser::table::parse_table;
use datamodel::prelude::*;
use datamodel::scan_model;
use std::fs;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bench_extract_metadata(c: &mut Criterion) {
    let path = fixture_path("t/fits_file.rst");
    let text = fs::read_to_string(&path).unwrap();

    c.bench_function("extract_metadata", |b| {
        b.iter(|| {
            let mut log = MemoryLog::new();
            let mut model =
                DocumentModel::from_text(path.clone(), fixture_path("t"), black_box(text.clone()));
            model.extract_metadata(false, &mut log)
        });
    });
}

fn bench_parse_table(c: &mut Criterion) {
    let text = fs::read_to_string(fixture_path("t/fits_file.rst")).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    c.bench_function("parse_table", |b| {
        b.iter(|| parse_table(black_box(lines.as_slice())));
    });
}

fn bench_files_to_regexp(c: &mut Criterion) {
    let root = fixture_path("DESI_SPECTRO_DATA");

    c.bench_function("files_to_regexp", |b| {
        b.iter(|| {
            let mut log = MemoryLog::new();
            let mut documents = scan_model(black_box(&root)).unwrap();
            datamodel::files_to_regexp(
                std::path::Path::new("/desi/spectro/data"),
                &mut documents,
                &mut log,
            )
        });
    });
}

criterion_group!(
    benches,
    bench_extract_metadata,
    bench_parse_table,
    bench_files_to_regexp
);
criterion_main!(benches);
