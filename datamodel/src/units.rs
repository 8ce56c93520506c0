//! Physical unit strings accepted in data model documents.
//!
//! Units follow the FITS standard: a base symbol, optionally with an SI
//! prefix, combined with `.`, `*`, `/`, spaces, parentheses and integer
//! powers (`cm2`, `s-1`, `m**2`, `m^2`), optionally preceded by a numeric
//! scale such as `1e-17` or `10**-17`. A handful of widely used non-standard
//! units are tolerated.

/// Symbols that accept an SI prefix.
const PREFIXABLE: &[&str] = &[
    "m", "g", "s", "rad", "sr", "K", "A", "mol", "cd", "Hz", "J", "W", "V", "N", "Pa", "C",
    "Ohm", "S", "F", "Wb", "T", "H", "lm", "lx", "eV", "Jy", "R", "G", "barn", "bit", "byte",
    "pc", "yr", "a", "erg", "mag", "D",
];

/// Symbols that never take a prefix.
const UNPREFIXED: &[&str] = &[
    "deg", "arcmin", "arcsec", "mas", "d", "h", "min", "AU", "au", "Angstrom", "angstrom",
    "solMass", "solLum", "solRad", "lyr", "u", "ct", "count", "photon", "ph", "adu", "pixel",
    "pix", "chan", "bin", "voxel", "beam", "Sun", "Ry", "Ba", "dex", "mmHg", "cy", "Bi",
    "Mx", "st", "Gal", "dyn", "P", "Debye", "Crab",
];

/// Tolerated units outside the FITS standard.
const ACCEPTABLE: &[&str] = &[
    "maggy", "maggies", "mgy", "nanomaggy", "nanomaggies", "nmgy", "electron", "electrons",
];

const PREFIXES: &[&str] = &[
    "da", "y", "z", "a", "f", "p", "n", "u", "m", "c", "d", "h", "k", "M", "G", "T", "P", "E",
    "Z", "Y",
];

/// Outcome of a successful unit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Standard,
    /// Not part of the FITS standard but tolerated.
    Acceptable,
}

/// Lookup of recognized unit strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitVocabulary;

impl UnitVocabulary {
    pub fn new() -> Self {
        Self
    }

    pub fn is_recognized(&self, unit: &str) -> bool {
        self.check(unit).is_ok()
    }

    /// Check a unit string; the error is the canonical bad-unit message.
    pub fn check(&self, unit: &str) -> Result<UnitStatus, String> {
        let trimmed = unit.trim();
        if ACCEPTABLE.contains(&trimmed) {
            return Ok(UnitStatus::Acceptable);
        }

        let chars: Vec<char> = trimmed.chars().collect();
        let mut status = UnitStatus::Standard;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() || matches!(c, '.' | '*' | '/' | '(' | ')' | '^') {
                i += 1;
            } else if c.is_ascii_digit() || ((c == '+' || c == '-') && next_is_digit(&chars, i)) {
                i = skip_number(&chars, i);
            } else if c.is_ascii_alphabetic() {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let symbol: String = chars[start..i].iter().collect();
                if ACCEPTABLE.contains(&symbol.as_str()) {
                    status = UnitStatus::Acceptable;
                } else if !is_symbol(&symbol) {
                    return Err(bad_unit_message(unit, start, &symbol));
                }
            } else {
                return Err(format!(
                    "'{}' did not parse as fits unit: At col {}, Illegal character '{}'.",
                    unit, i, c
                ));
            }
        }
        Ok(status)
    }
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).map_or(false, |c| c.is_ascii_digit())
}

/// Skip a signed integer or float, including an exponent such as `e-17`.
fn skip_number(chars: &[char], mut i: usize) -> usize {
    if chars[i] == '+' || chars[i] == '-' {
        i += 1;
    }
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        i += 1;
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

fn is_symbol(symbol: &str) -> bool {
    if PREFIXABLE.contains(&symbol) || UNPREFIXED.contains(&symbol) {
        return true;
    }
    PREFIXES.iter().any(|p| {
        symbol
            .strip_prefix(p)
            .map_or(false, |base| PREFIXABLE.contains(&base))
    })
}

fn bad_unit_message(unit: &str, col: usize, symbol: &str) -> String {
    let mut message = format!(
        "'{}' did not parse as fits unit: At col {}, Unit '{}' not supported by the FITS standard.",
        unit, col, symbol
    );
    if let Some(singular) = symbol.strip_suffix('s') {
        if is_symbol(singular) {
            message.push_str(&format!(" Did you mean {}?", singular));
        }
    }
    message
}

/// Keywords whose value is a unit string.
pub fn is_unit_keyword(name: &str) -> bool {
    name == "BUNIT"
        || name
            .strip_prefix("TUNIT")
            .map_or(false, |n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
