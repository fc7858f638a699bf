//! Header extraction from XISF files.
//!
//! An XISF monolithic file starts with a fixed binary prefix followed by an
//! XML header:
//!
//! ```text
//! [ "XISF0100" ][ u32 LE header length ][ 4 reserved bytes ][ XML header ]
//! ```
//!
//! The XML carries FITS keywords as `<FITSKeyword name=".." value=".."
//! comment=".."/>` elements under `<xisf><Image>`. Attribute values are
//! untyped strings, so each one goes through [`infer_value`].

use std::io::{ErrorKind, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::value::{HeaderMap, HeaderValue};

/// Signature at offset 0 of every monolithic XISF 1.0 file.
pub const SIGNATURE: &[u8; 8] = b"XISF0100";

const ROOT_ELEMENT: &[u8] = b"xisf";
const IMAGE_ELEMENT: &[u8] = b"Image";
const KEYWORD_ELEMENT: &[u8] = b"FITSKeyword";

/// Reads the XML header of an XISF stream.
///
/// Like the FITS decoder, [`XisfDecoder::read_header`] consumes the decoder
/// and drops the reader on every exit path.
#[derive(Debug)]
pub struct XisfDecoder<R> {
    reader: R,
}

/// One `FITSKeyword` element with its raw attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordRecord {
    pub name: String,
    pub value: String,
    pub comment: String,
}

impl<R: Read> XisfDecoder<R> {
    pub fn new(reader: R) -> Self {
        XisfDecoder { reader }
    }

    fn read_exact_or(&mut self, buf: &mut [u8], short: DecodeError) -> Result<(), DecodeError> {
        self.reader.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => short,
            _ => DecodeError::Io(e),
        })
    }

    fn check_signature(&mut self) -> Result<(), DecodeError> {
        let mut signature = [0u8; 8];
        self.read_exact_or(&mut signature, DecodeError::InvalidSignature)?;
        if &signature != SIGNATURE {
            return Err(DecodeError::InvalidSignature);
        }
        Ok(())
    }

    fn header_length(&mut self) -> Result<u32, DecodeError> {
        let mut len = [0u8; 4];
        self.read_exact_or(&mut len, DecodeError::InvalidHeaderLength)?;
        Ok(u32::from_le_bytes(len))
    }

    fn skip_reserved(&mut self) -> Result<(), DecodeError> {
        let mut reserved = [0u8; 4];
        self.read_exact_or(&mut reserved, DecodeError::InvalidHeaderLength)
    }

    /// Read the raw XML header bytes that follow the binary prefix.
    pub fn read_xml(mut self) -> Result<Vec<u8>, DecodeError> {
        self.check_signature()?;
        let len = self.header_length()?;
        self.skip_reserved()?;

        // Grow the buffer as bytes arrive instead of trusting the prefix.
        let mut xml = Vec::new();
        self.reader.by_ref().take(u64::from(len)).read_to_end(&mut xml)?;
        if xml.len() != len as usize {
            return Err(DecodeError::InvalidHeaderLength);
        }
        Ok(xml)
    }

    /// Decode the header into a [`HeaderMap`].
    pub fn read_header(self) -> Result<HeaderMap, DecodeError> {
        let xml = self.read_xml()?;
        let text = std::str::from_utf8(&xml)
            .map_err(|e| DecodeError::XmlParse(format!("header is not UTF-8: {e}")))?;
        let records = parse_keywords(text)?;

        let mut map = HeaderMap::new();
        for record in records {
            if record.name.is_empty() {
                debug!(value = %record.value, "skipping FITSKeyword without a name");
                continue;
            }
            match infer_value(&record.name, &record.value)? {
                Some(value) => map.insert(record.name, value),
                None => warn!(
                    keyword = %record.name,
                    value = %record.value,
                    "unable to parse header value; skipping keyword"
                ),
            }
        }

        debug!(keywords = map.len(), "decoded XISF header");
        Ok(map)
    }
}

/// Decode the header of an XISF stream.
pub fn decode_xml_header<R: Read>(reader: R) -> Result<HeaderMap, DecodeError> {
    XisfDecoder::new(reader).read_header()
}

/// A missing attribute reads as the empty string.
fn attribute(element: &BytesStart<'_>, name: &str) -> Result<String, DecodeError> {
    match element.try_get_attribute(name).map_err(quick_xml::Error::from)? {
        Some(attr) => Ok(attr.unescape_value()?.into_owned()),
        None => Ok(String::new()),
    }
}

/// Collect every `xisf/Image/FITSKeyword` element in document order.
pub fn parse_keywords(xml: &str) -> Result<Vec<KeywordRecord>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut records = Vec::new();

    loop {
        let event = reader.read_event()?;
        let (element, opens) = match &event {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(_) => {
                path.pop();
                if path.is_empty() {
                    return Ok(records);
                }
                continue;
            }
            Event::Eof => {
                return Err(DecodeError::XmlParse(if seen_root {
                    String::from("unexpected end of document")
                } else {
                    String::from("missing xisf root element")
                }));
            }
            _ => continue,
        };

        let local = element.local_name().as_ref().to_vec();
        if !seen_root {
            if local != ROOT_ELEMENT {
                return Err(DecodeError::XmlParse(format!(
                    "expected root element <xisf>, found <{}>",
                    String::from_utf8_lossy(&local)
                )));
            }
            seen_root = true;
            if !opens {
                return Ok(records);
            }
        } else if local == KEYWORD_ELEMENT
            && path.len() == 2
            && path[1].as_slice() == IMAGE_ELEMENT
        {
            records.push(KeywordRecord {
                name: attribute(element, "name")?,
                value: attribute(element, "value")?,
                comment: attribute(element, "comment")?,
            });
        }

        if opens {
            path.push(local);
        }
    }
}

fn is_quoted(raw: &str) -> bool {
    raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') && !raw.contains('\n')
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(&['+', '-'][..]).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Infer a typed value from an untyped XISF keyword value.
///
/// Rules apply in order, first match wins: empty → `Absent`; `'…'` →
/// `Text` without the quotes; optionally signed digits → `Integer`; `T` /
/// `F` → `Boolean`; otherwise a float. `Ok(None)` means the value is not a
/// float either and the keyword should be dropped.
pub fn infer_value(keyword: &str, raw: &str) -> Result<Option<HeaderValue>, DecodeError> {
    if raw.is_empty() {
        return Ok(Some(HeaderValue::Absent));
    }

    if is_quoted(raw) {
        return Ok(Some(HeaderValue::Text(String::from(&raw[1..raw.len() - 1]))));
    }

    if is_integer(raw) {
        return raw
            .parse::<i64>()
            .map(|n| Some(HeaderValue::Integer(n)))
            .map_err(|_| DecodeError::IntegerOutOfRange {
                keyword: String::from(keyword),
                value: String::from(raw),
            });
    }

    match raw {
        "T" => return Ok(Some(HeaderValue::Boolean(true))),
        "F" => return Ok(Some(HeaderValue::Boolean(false))),
        _ => {}
    }

    Ok(raw.parse::<f64>().ok().map(HeaderValue::Float))
}
