pub mod fits;
pub mod pattern;
pub mod rst;
pub mod schema;
pub mod table;

// Re-export for convenience
pub use fits::FitsReader;
pub use pattern::FilePattern;
pub use rst::{extract_schema, SchemaExtractor};
pub use schema::*;
pub use table::{parse_table, Table};
