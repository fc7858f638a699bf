//! FITS header card parsing.
//!
//! A card is one 80-byte keyword record. Only the parsing direction is
//! implemented; cards are never written back.

use std::str;

use crate::block::CARD_SIZE;
use crate::error::DecodeError;

// ── Types ──

/// A value as it appears natively in a FITS card.
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
    /// FITS complex integer `(real, imaginary)`.
    ComplexInt(i64, i64),
    /// FITS complex float `(real, imaginary)`.
    ComplexFloat(f64, f64),
}

impl CardValue {
    /// Short name of the native value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            CardValue::Logical(_) => "logical",
            CardValue::Integer(_) => "integer",
            CardValue::Float(_) => "float",
            CardValue::String(_) => "string",
            CardValue::ComplexInt(..) => "complex integer",
            CardValue::ComplexFloat(..) => "complex float",
        }
    }
}

/// A parsed FITS header card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; 8],
    /// `true` if bytes 8..10 hold the `= ` value indicator.
    pub indicator: bool,
    /// The parsed value; `None` when the value field is blank.
    pub value: Option<CardValue>,
    /// An optional comment string.
    pub comment: Option<String>,
}

impl Card {
    /// Return the keyword as a trimmed UTF-8 string.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map(|i| i + 1)
            .unwrap_or(0);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// Returns `true` if this card is the END keyword.
    pub fn is_end(&self) -> bool {
        &self.keyword == b"END     "
    }

    /// Returns `true` if this is a blank card (keyword is all spaces).
    pub fn is_blank(&self) -> bool {
        self.keyword.iter().all(|&b| b == b' ')
    }

    /// Returns `true` if this card carries a commentary keyword
    /// (COMMENT, HISTORY, or blank).
    pub fn is_commentary(&self) -> bool {
        is_commentary_keyword(&self.keyword)
    }
}

// ── Card parsing ──

/// Keywords that never carry a value indicator. Their bytes 8..80 are free-form text.
const COMMENTARY_KEYWORDS: [&[u8; 8]; 3] = [b"COMMENT ", b"HISTORY ", b"        "];

fn is_commentary_keyword(keyword: &[u8; 8]) -> bool {
    COMMENTARY_KEYWORDS.contains(&keyword)
}

fn free_text(bytes: &[u8]) -> Result<Option<String>, DecodeError> {
    let text = str::from_utf8(bytes)
        .map_err(|_| DecodeError::InvalidHeader)?
        .trim_end();
    Ok((!text.is_empty()).then(|| String::from(text)))
}

/// Parse a single 80-byte FITS header card.
pub fn parse_card(card_bytes: &[u8; CARD_SIZE]) -> Result<Card, DecodeError> {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&card_bytes[..8]);

    for &b in &keyword {
        match b {
            b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_' => {}
            _ => return Err(DecodeError::InvalidKeyword),
        }
    }

    if &keyword == b"END     " {
        return Ok(Card {
            keyword,
            indicator: false,
            value: None,
            comment: None,
        });
    }

    if is_commentary_keyword(&keyword) || !(card_bytes[8] == b'=' && card_bytes[9] == b' ') {
        return Ok(Card {
            keyword,
            indicator: false,
            value: None,
            comment: free_text(&card_bytes[8..CARD_SIZE])?,
        });
    }

    let value_field = &card_bytes[10..CARD_SIZE];
    match parse_value(value_field) {
        Some((val, comment)) => Ok(Card {
            keyword,
            indicator: true,
            value: Some(val),
            comment: comment.map(String::from),
        }),
        None => {
            let field_str = str::from_utf8(value_field).map_err(|_| DecodeError::InvalidHeader)?;
            let (val_part, comment) = split_comment(value_field);
            let text = field_str[..val_part.len()].trim();
            if !text.is_empty() && !text.starts_with('/') {
                return Err(DecodeError::InvalidValue {
                    keyword: String::from_utf8_lossy(&keyword).trim_end().to_string(),
                    text: String::from(text),
                });
            }
            Ok(Card {
                keyword,
                indicator: true,
                value: None,
                comment: comment.map(String::from),
            })
        }
    }
}

// ── Value parsing ──

/// Find a ` /` comment separator and return the comment text after it.
///
/// Real-world writers often omit the space after the slash, so only the
/// leading space is required.
fn comment_after(remainder: &[u8]) -> Option<&str> {
    let pos = remainder.windows(2).position(|w| w == b" /")?;
    let mut start = pos + 2;
    if remainder.get(start) == Some(&b' ') {
        start += 1;
    }
    str::from_utf8(&remainder[start..])
        .ok()
        .map(|s| s.trim_end())
        .filter(|s| !s.is_empty())
}

/// Split a non-string value field at the comment separator.
fn split_comment(field: &[u8]) -> (&[u8], Option<&str>) {
    match field.windows(2).position(|w| w == b" /") {
        Some(pos) => (&field[..pos], comment_after(&field[pos..])),
        None => (field, None),
    }
}

/// Parse a quoted FITS string starting at `field[0] == '\''`.
///
/// Doubled quotes inside the string stand for a literal `'`. An
/// unterminated string is accepted as-is.
fn parse_string(field: &[u8]) -> (CardValue, Option<&str>) {
    let mut value = String::new();
    let mut i = 1;

    while i < field.len() {
        if field[i] == b'\'' {
            if field.get(i + 1) == Some(&b'\'') {
                value.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            break;
        }
        value.push(field[i] as char);
        i += 1;
    }

    // FITS pads short strings to 8 characters.
    let trimmed = String::from(value.trim_end());
    let rest = field.get(i..).unwrap_or(&[]);
    (CardValue::String(trimmed), comment_after(rest))
}

fn parse_complex(text: &str) -> Option<CardValue> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    let (left, right) = inner.split_once(',')?;
    let (left, right) = (left.trim(), right.trim());

    if !left.contains('.') && !right.contains('.') {
        if let (Ok(re), Ok(im)) = (left.parse::<i64>(), right.parse::<i64>()) {
            return Some(CardValue::ComplexInt(re, im));
        }
    }

    Some(CardValue::ComplexFloat(
        parse_float_str(left)?,
        parse_float_str(right)?,
    ))
}

/// Parse a float string, handling FITS `D` exponent notation.
fn parse_float_str(s: &str) -> Option<f64> {
    s.replace(&['D', 'd'][..], "E").parse::<f64>().ok()
}

/// Parse the 70-byte value field of a card (bytes 10..80).
///
/// Returns `None` for a blank value field.
pub fn parse_value(value_bytes: &[u8]) -> Option<(CardValue, Option<&str>)> {
    let start = value_bytes.iter().position(|&b| b != b' ')?;
    let field = &value_bytes[start..];

    if field[0] == b'\'' {
        return Some(parse_string(field));
    }

    let (val_part, comment) = split_comment(value_bytes);
    let val_text = str::from_utf8(val_part).ok()?.trim();
    if val_text.is_empty() {
        return None;
    }

    match val_text {
        "T" => return Some((CardValue::Logical(true), comment)),
        "F" => return Some((CardValue::Logical(false), comment)),
        _ => {}
    }

    if val_text.starts_with('(') {
        if let Some(v) = parse_complex(val_text) {
            return Some((v, comment));
        }
    }

    if !val_text.contains(&['.', 'E', 'e', 'D', 'd'][..]) {
        if let Ok(n) = val_text.parse::<i64>() {
            return Some((CardValue::Integer(n), comment));
        }
    }

    parse_float_str(val_text).map(|f| (CardValue::Float(f), comment))
}
