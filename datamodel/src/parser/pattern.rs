//! Filename patterns for data model documents.
//!
//! A document living at `<doc root>/NIGHT/EXPID/desi-EXPID.rst` and declaring
//! `:Regex: ``desi-[0-9]{8}\.fits\.fz``` describes files matching
//! `^<data root>/(?P<NIGHT>[0-9]{8})/(?P<EXPID>[0-9]{8})/desi-[0-9]{8}\.fits\.fz$`.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::core::DataModelError;

/// Placeholder directory tokens and the values they stand for.
pub const PLACEHOLDERS: &[(&str, &str)] = &[
    ("BRICKNAME", "[0-9]+[pm][0-9]+"),
    ("CAMERA", "[brz][0-9]"),
    ("EXPID", "[0-9]{8}"),
    ("GROUPID", "[0-9]+"),
    ("NIGHT", "[0-9]{8}"),
    ("PIXGROUP", "[0-9]+"),
    ("PIXNUM", "[0-9]+"),
    ("PIXPROD", "[a-z0-9_-]+"),
    ("PRODNAME", "[a-z0-9_-]+"),
    ("PROGRAM", "[a-z]+"),
    ("SPECPROD", "[a-z0-9_-]+"),
    ("SPECTROGRAPH", "[0-9]"),
    ("SURVEY", "[a-z0-9]+"),
    ("TILEID", "[0-9]+"),
];

fn wildcard(name: &str) -> Option<&'static str> {
    PLACEHOLDERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, w)| *w)
}

fn regex_line() -> &'static Regex {
    static LINE: OnceLock<Regex> = OnceLock::new();
    LINE.get_or_init(|| Regex::new(r"(?i)^:?regexp?:").expect("static regex"))
}

/// The filename regex declared by a `:Regex:` line, if `line` is one.
pub fn declared_regex(line: &str) -> Option<String> {
    if !regex_line().is_match(line) {
        return None;
    }
    line.split_whitespace()
        .nth(1)
        .map(|r| r.replace("``", ""))
        .filter(|r| !r.is_empty())
}

/// First filename regex declared in a document.
pub fn find_declared_regex(text: &str) -> Option<String> {
    text.lines().find_map(declared_regex)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder(String),
    Regex(String),
}

/// Compiled matcher for the real files a document describes.
#[derive(Debug, Clone)]
pub struct FilePattern {
    pieces: Vec<Piece>,
    regex: Regex,
}

impl FilePattern {
    /// Compile the pattern for a document directory relative to its
    /// documentation root, mapped onto `data_root`.
    pub fn compile(
        data_root: &Path,
        relative_dir: &Path,
        filename_regex: &str,
    ) -> Result<Self, DataModelError> {
        let mut pieces = vec![Piece::Literal(data_root.to_string_lossy().into_owned())];
        for component in relative_dir.components() {
            let text = component.as_os_str().to_string_lossy();
            if text.is_empty() || text == "." {
                continue;
            }
            pieces.push(Piece::Literal("/".to_string()));
            pieces.extend(split_placeholders(&text));
        }
        pieces.push(Piece::Literal("/".to_string()));
        pieces.push(Piece::Regex(filename_regex.to_string()));
        Self::from_pieces(normalize(pieces))
    }

    fn from_pieces(pieces: Vec<Piece>) -> Result<Self, DataModelError> {
        let mut source = String::from("^");
        let mut named: Vec<&str> = Vec::new();
        for piece in &pieces {
            match piece {
                Piece::Literal(text) => source.push_str(&regex::escape(text)),
                Piece::Regex(text) => source.push_str(&format!("(?:{})", text)),
                Piece::Placeholder(name) => {
                    let w = wildcard(name).unwrap_or(".+");
                    if named.contains(&name.as_str()) {
                        source.push_str(&format!("(?:{})", w));
                    } else {
                        named.push(name.as_str());
                        source.push_str(&format!("(?P<{}>{})", name, w));
                    }
                }
            }
        }
        source.push('$');
        let regex = Regex::new(&source)?;
        Ok(Self { pieces, regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }

    /// Placeholder names in path order, without repeats.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for piece in &self.pieces {
            if let Piece::Placeholder(name) = piece {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    /// Placeholder values of a matching path.
    pub fn captures(&self, path: &Path) -> Option<BTreeMap<String, String>> {
        let text = path.to_string_lossy();
        let caps = self.regex.captures(&text)?;
        Some(
            self.placeholders()
                .into_iter()
                .filter_map(|name| {
                    caps.name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect(),
        )
    }

    /// A narrower pattern with the given placeholders replaced by literal
    /// values. Placeholders without a value stay wild.
    pub fn instantiate(&self, values: &[(&str, &str)]) -> Result<Self, DataModelError> {
        let pieces = self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Placeholder(name) => values
                    .iter()
                    .find(|(n, _)| *n == name.as_str())
                    .map(|(_, v)| Piece::Literal((*v).to_string()))
                    .unwrap_or_else(|| piece.clone()),
                other => other.clone(),
            })
            .collect();
        Self::from_pieces(normalize(pieces))
    }
}

impl std::fmt::Display for FilePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a path component into literal text and placeholder tokens. A
/// placeholder only counts when not glued to other letters or digits.
fn split_placeholders(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    'scan: while i < chars.len() {
        let bounded_left = i == 0 || !chars[i - 1].is_ascii_alphanumeric();
        if bounded_left {
            for (name, _) in PLACEHOLDERS {
                let len = name.len();
                if i + len > chars.len() {
                    continue;
                }
                let candidate: String = chars[i..i + len].iter().collect();
                let bounded_right =
                    i + len == chars.len() || !chars[i + len].is_ascii_alphanumeric();
                if candidate == *name && bounded_right {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Placeholder(name.to_string()));
                    i += len;
                    continue 'scan;
                }
            }
        }
        literal.push(chars[i]);
        i += 1;
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    pieces
}

/// Merge adjacent literals and drop doubled separators.
fn normalize(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if let (Some(Piece::Literal(prev)), Piece::Literal(next)) = (out.last_mut(), &piece) {
            if prev.ends_with('/') && next.starts_with('/') {
                prev.push_str(&next[1..]);
            } else {
                prev.push_str(next);
            }
            continue;
        }
        out.push(piece);
    }
    out
}
