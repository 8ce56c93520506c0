use serde::{Deserialize, Serialize};
use std::fmt;

/// Header keyword row: name, example value, type, comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordEntry {
    pub name: String,
    pub value: String,
    pub type_tag: String,
    pub comment: String,
}

impl KeywordEntry {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        type_tag: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            type_tag: type_tag.into(),
            comment: comment.into(),
        }
    }

    pub fn as_tuple(&self) -> (&str, &str, &str, &str) {
        (&self.name, &self.value, &self.type_tag, &self.comment)
    }
}

/// Table column row: name, type, unit, description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnEntry {
    pub name: String,
    pub type_tag: String,
    pub unit: String,
    pub description: String,
}

impl ColumnEntry {
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            unit: unit.into(),
            description: description.into(),
        }
    }

    pub fn as_tuple(&self) -> (&str, &str, &str, &str) {
        (&self.name, &self.type_tag, &self.unit, &self.description)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    Image,
    Table,
    BinTable,
}

impl ExtensionType {
    pub fn from_xtension(value: &str) -> Option<Self> {
        match value.trim() {
            "IMAGE" => Some(ExtensionType::Image),
            "TABLE" => Some(ExtensionType::Table),
            "BINTABLE" => Some(ExtensionType::BinTable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Image => "IMAGE",
            ExtensionType::Table => "TABLE",
            ExtensionType::BinTable => "BINTABLE",
        }
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a section carries besides its header keywords.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SectionData {
    Image { format: String },
    Table { kind: ExtensionType, columns: Vec<ColumnEntry> },
}

/// One HDU as documented or as found in a real file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionSchema {
    pub title: String,
    pub number: usize,
    pub extname: Option<String>,
    pub keywords: Vec<KeywordEntry>,
    pub data: SectionData,
}

impl SectionSchema {
    pub fn extension(&self) -> ExtensionType {
        match &self.data {
            SectionData::Image { .. } => ExtensionType::Image,
            SectionData::Table { kind, .. } => *kind,
        }
    }

    pub fn is_primary(&self) -> bool {
        self.number == 0
    }

    pub fn columns(&self) -> &[ColumnEntry] {
        match &self.data {
            SectionData::Table { columns, .. } => columns,
            SectionData::Image { .. } => &[],
        }
    }

    pub fn image_format(&self) -> Option<&str> {
        match &self.data {
            SectionData::Image { format } => Some(format),
            SectionData::Table { .. } => None,
        }
    }

    pub fn keyword(&self, name: &str) -> Option<&KeywordEntry> {
        self.keywords.iter().find(|k| k.name == name)
    }

    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.name.as_str())
    }

    /// Name used to key the section: the EXTNAME, or empty when there is none.
    pub fn key(&self) -> &str {
        self.extname.as_deref().unwrap_or("")
    }
}

/// Sections of one file, in HDU order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    sections: Vec<SectionSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section; its number becomes its position.
    pub fn push(&mut self, mut section: SectionSchema) {
        section.number = self.sections.len();
        self.sections.push(section);
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, extname: &str) -> Option<&SectionSchema> {
        self.sections
            .iter()
            .find(|s| s.extname.as_deref() == Some(extname))
    }

    pub fn section(&self, number: usize) -> Option<&SectionSchema> {
        self.sections.get(number)
    }

    pub fn section_mut(&mut self, number: usize) -> Option<&mut SectionSchema> {
        self.sections.get_mut(number)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SectionSchema> {
        self.sections.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key())
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a SectionSchema;
    type IntoIter = std::slice::Iter<'a, SectionSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

impl FromIterator<SectionSchema> for Schema {
    fn from_iter<I: IntoIterator<Item = SectionSchema>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for section in iter {
            schema.push(section);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(title: &str, extname: Option<&str>) -> SectionSchema {
        SectionSchema {
            title: title.to_string(),
            number: 99,
            extname: extname.map(str::to_string),
            keywords: vec![],
            data: SectionData::Image {
                format: "Empty HDU.".to_string(),
            },
        }
    }

    #[test]
    fn push_renumbers_contiguously() {
        let schema: Schema = vec![image("HDU0", Some("PRIMARY")), image("HDU1", None)]
            .into_iter()
            .collect();
        let numbers: Vec<_> = schema.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![0, 1]);
        assert!(schema.section(0).unwrap().is_primary());
    }

    #[test]
    fn lookup_by_name() {
        let schema: Schema = vec![image("HDU0", Some("PRIMARY")), image("HDU1", Some("FLUX"))]
            .into_iter()
            .collect();
        assert_eq!(schema.get("FLUX").map(|s| s.number), Some(1));
        assert!(schema.get("").is_none());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["PRIMARY", "FLUX"]);
    }

    #[test]
    fn extension_follows_payload() {
        let mut section = image("HDU1", Some("T"));
        assert_eq!(section.extension(), ExtensionType::Image);
        section.data = SectionData::Table {
            kind: ExtensionType::BinTable,
            columns: vec![],
        };
        assert_eq!(section.extension().to_string(), "BINTABLE");
    }
}
