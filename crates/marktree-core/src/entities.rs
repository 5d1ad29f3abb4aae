//! Character reference decoding (`&amp;`, `&#123;`, `&#x7B;`).
//!
//! Decoding never fails. Malformed references are reported as warnings
//! pointing at their `&`, and either decode anyway (missing semicolon,
//! disallowed code points) or are kept as raw text.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

const NAMED_NOT_TERMINATED: &str = "Named character references must be terminated by a semicolon";
const NUMERIC_NOT_TERMINATED: &str =
    "Numeric character references must be terminated by a semicolon";
const NUMERIC_EMPTY: &str = "Numeric character references cannot be empty";
const NAMED_UNKNOWN: &str = "Named character references must be known";
const NUMERIC_DISALLOWED: &str = "Numeric character references cannot be disallowed";
const NUMERIC_PROHIBITED: &str =
    "Numeric character references cannot be outside the permissible Unicode range";

const REPLACEMENT: char = '\u{fffd}';

/// A run of decoded output along with the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub source: &'a str,
    pub value: Cow<'a, str>,
}

/// A problem with a reference, at a byte index into the decoded input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityWarning {
    pub reason: &'static str,
    pub index: usize,
}

struct Tables {
    /// Names that must be followed by `;`.
    terminated: HashMap<&'static str, &'static str>,
    /// Legacy names that also decode without `;`.
    legacy: HashMap<&'static str, &'static str>,
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut terminated = HashMap::new();
        let mut legacy = HashMap::new();
        for entity in entities::ENTITIES.iter() {
            let name = entity.entity.trim_start_matches('&');
            match name.strip_suffix(';') {
                Some(name) => terminated.insert(name, entity.characters),
                None => legacy.insert(name, entity.characters),
            };
        }
        Tables { terminated, legacy }
    })
}

/// Look up a named reference, given without `&` and `;`.
pub fn named(name: &str) -> Option<&'static str> {
    tables().terminated.get(name).copied()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Named,
    Decimal,
    Hexadecimal,
}

impl Kind {
    fn accepts(self, byte: u8) -> bool {
        match self {
            Kind::Named => byte.is_ascii_alphanumeric(),
            Kind::Decimal => byte.is_ascii_digit(),
            Kind::Hexadecimal => byte.is_ascii_hexdigit(),
        }
    }

    fn radix(self) -> u32 {
        match self {
            Kind::Hexadecimal => 16,
            _ => 10,
        }
    }
}

/// A reference recognized at some `&`.
struct Reference {
    /// Byte index just past the reference.
    end: usize,
    value: Option<Cow<'static, str>>,
}

/// Decode `input` into alternating text and reference chunks.
///
/// Concatenating every chunk's `source` yields `input`; concatenating every
/// `value` yields the decoded text.
pub fn decode<'a>(input: &'a str, warnings: &mut Vec<EntityWarning>) -> Vec<Chunk<'a>> {
    let bytes = input.as_bytes();
    let mut chunks = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(found) = memchr::memchr(b'&', &bytes[search..]) {
        let begin = search + found;
        let Some(reference) = reference_at(input, begin, warnings) else {
            search = begin + 1;
            continue;
        };

        if let Some(value) = reference.value {
            if text_start < begin {
                let text = &input[text_start..begin];
                chunks.push(Chunk {
                    source: text,
                    value: Cow::Borrowed(text),
                });
            }
            chunks.push(Chunk {
                source: &input[begin..reference.end],
                value,
            });
            text_start = reference.end;
        }
        search = reference.end.max(begin + 1);
    }

    if text_start < input.len() {
        let text = &input[text_start..];
        chunks.push(Chunk {
            source: text,
            value: Cow::Borrowed(text),
        });
    }

    chunks
}

/// Decode `input` into a single string.
pub fn decode_raw<'a>(input: &'a str, warnings: &mut Vec<EntityWarning>) -> Cow<'a, str> {
    if memchr::memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let chunks = decode(input, warnings);
    if let [single] = chunks.as_slice() {
        if single.source == single.value {
            return Cow::Borrowed(input);
        }
    }
    Cow::Owned(chunks.into_iter().map(|chunk| chunk.value).collect())
}

fn reference_at(input: &str, begin: usize, warnings: &mut Vec<EntityWarning>) -> Option<Reference> {
    let bytes = input.as_bytes();
    let mut index = begin + 1;

    match bytes.get(index) {
        None | Some(b'\t' | b'\n' | b'\x0c' | b' ' | b'&' | b'<') => return None,
        _ => {}
    }

    let kind = if bytes[index] == b'#' {
        index += 1;
        if matches!(bytes.get(index), Some(b'x' | b'X')) {
            index += 1;
            Kind::Hexadecimal
        } else {
            Kind::Decimal
        }
    } else {
        Kind::Named
    };

    let start = index;
    let legacy = &tables().legacy;
    let mut entity: Option<&'static str> = None;
    let mut entity_end = start;

    while index < bytes.len() && kind.accepts(bytes[index]) {
        index += 1;
        if kind == Kind::Named {
            if let Some(&found) = legacy.get(&input[start..index]) {
                entity = Some(found);
                entity_end = index;
            }
        }
    }

    let characters = &input[start..index];
    let mut terminated = bytes.get(index) == Some(&b';');
    let mut end = index;
    if terminated {
        end += 1;
        if kind == Kind::Named {
            if let Some(found) = named(characters) {
                entity = Some(found);
                entity_end = index;
            }
        }
    }

    if characters.is_empty() {
        if kind != Kind::Named {
            warnings.push(EntityWarning {
                reason: NUMERIC_EMPTY,
                index: begin,
            });
        }
        return Some(Reference { end, value: None });
    }

    if kind == Kind::Named {
        if terminated && entity.is_none() {
            warnings.push(EntityWarning {
                reason: NAMED_UNKNOWN,
                index: begin,
            });
            return Some(Reference { end, value: None });
        }

        if entity_end != index {
            end = entity_end;
            terminated = false;
        }

        if !terminated && entity.is_some() {
            warnings.push(EntityWarning {
                reason: NAMED_NOT_TERMINATED,
                index: begin,
            });
        }

        return Some(Reference {
            end,
            value: entity.map(Cow::Borrowed),
        });
    }

    if !terminated {
        warnings.push(EntityWarning {
            reason: NUMERIC_NOT_TERMINATED,
            index: begin,
        });
    }

    let code = characters.bytes().fold(0u32, |acc, byte| {
        let digit = (byte as char).to_digit(kind.radix()).unwrap_or(0);
        acc.saturating_mul(kind.radix()).saturating_add(digit)
    });

    let decoded = if is_prohibited(code) {
        warnings.push(EntityWarning {
            reason: NUMERIC_PROHIBITED,
            index: begin,
        });
        REPLACEMENT
    } else if let Some(replacement) = windows_1252(code) {
        warnings.push(EntityWarning {
            reason: NUMERIC_DISALLOWED,
            index: begin,
        });
        replacement
    } else {
        if is_disallowed(code) {
            warnings.push(EntityWarning {
                reason: NUMERIC_DISALLOWED,
                index: begin,
            });
        }
        char::from_u32(code).unwrap_or(REPLACEMENT)
    };

    Some(Reference {
        end,
        value: Some(Cow::Owned(decoded.to_string())),
    })
}

fn is_prohibited(code: u32) -> bool {
    (0xD800..=0xDFFF).contains(&code) || code > 0x10FFFF
}

fn is_disallowed(code: u32) -> bool {
    (0x0001..=0x0008).contains(&code)
        || code == 0x000B
        || (0x000D..=0x001F).contains(&code)
        || (0x007F..=0x009F).contains(&code)
        || (0xFDD0..=0xFDEF).contains(&code)
        || (code & 0xFFFF) == 0xFFFF
        || (code & 0xFFFF) == 0xFFFE
}

/// Code points that browsers map as if they were windows-1252 bytes.
fn windows_1252(code: u32) -> Option<char> {
    let mapped = match code {
        0x00 => '\u{fffd}',
        0x80 => '\u{20ac}',
        0x82 => '\u{201a}',
        0x83 => '\u{0192}',
        0x84 => '\u{201e}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02c6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017d}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201c}',
        0x94 => '\u{201d}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02dc}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203a}',
        0x9C => '\u{0153}',
        0x9E => '\u{017e}',
        0x9F => '\u{0178}',
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(input: &str) -> (String, Vec<&'static str>) {
        let mut warnings = Vec::new();
        let value = decode_raw(input, &mut warnings).into_owned();
        (value, warnings.into_iter().map(|w| w.reason).collect())
    }

    #[test]
    fn decodes_named_and_numeric() {
        assert_eq!(raw("a &amp; b &#65;&#x42;"), ("a & b AB".to_string(), vec![]));
        assert_eq!(raw("&copy;&hellip;").0, "©…");
    }

    #[test]
    fn legacy_names_decode_without_semicolon() {
        let (value, warnings) = raw("&copy 2024");
        assert_eq!(value, "© 2024");
        assert_eq!(warnings, vec![NAMED_NOT_TERMINATED]);
    }

    #[test]
    fn unknown_and_bare_ampersands_stay_raw() {
        assert_eq!(raw("AT&T & co"), ("AT&T & co".to_string(), vec![]));
        assert_eq!(raw("&bogus;"), ("&bogus;".to_string(), vec![NAMED_UNKNOWN]));
    }

    #[test]
    fn numeric_problems_warn() {
        assert_eq!(raw("&#;"), ("&#;".to_string(), vec![NUMERIC_EMPTY]));
        assert_eq!(raw("&#65"), ("A".to_string(), vec![NUMERIC_NOT_TERMINATED]));
        assert_eq!(raw("&#xD800;"), ("\u{fffd}".to_string(), vec![NUMERIC_PROHIBITED]));
        assert_eq!(raw("&#128;"), ("€".to_string(), vec![NUMERIC_DISALLOWED]));
    }

    #[test]
    fn chunks_cover_input() {
        let mut warnings = Vec::new();
        let input = "x &lt; y";
        let chunks = decode(input, &mut warnings);
        let source: String = chunks.iter().map(|c| c.source).collect();
        assert_eq!(source, input);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].value, "<");
    }
}
