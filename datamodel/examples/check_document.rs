//! Extract one data model document and print its schema.

use datamodel::prelude::*;
use std::path::Path;

fn main() -> Result<(), DataModelError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/t/fits_file.rst".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example check_document [path/to/model.rst]");
        std::process::exit(1);
    }

    let mut log = MemoryLog::new();
    let schema = ModelChecker::inspect(path, &mut log)?;

    println!("Schema of: {}", path.display());
    println!("Sections: {}", schema.len());
    println!();

    for section in &schema {
        println!(
            "{} ({}) EXTNAME = {}",
            section.title,
            section.extension(),
            section.extname.as_deref().unwrap_or("<none>")
        );
        for keyword in &section.keywords {
            println!("    {:<8} {:<6} {}", keyword.name, keyword.type_tag, keyword.value);
        }
        for column in section.columns() {
            println!("    column {} {} {}", column.name, column.type_tag, column.unit);
        }
    }

    if !log.is_empty() {
        println!();
        println!("Messages:");
        for entry in log.entries() {
            println!("  {:?}: {}", entry.severity, entry.message);
        }
    }

    Ok(())
}
