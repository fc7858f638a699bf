//! The typed header value model shared by the FITS and XISF decoders.

use std::collections::BTreeMap;

/// A decoded header value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Character string, without FITS quoting.
    Text(String),
    /// Logical value (`T` or `F`).
    Boolean(bool),
    /// Integer value of any native width, widened to 64 bits.
    Integer(i64),
    /// Floating-point value of any native width, widened to 64 bits.
    Float(f64),
    /// A keyword that is present but carries no value.
    Absent,
}

impl HeaderValue {
    /// Returns `true` for [`HeaderValue::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, HeaderValue::Absent)
    }

    /// Returns `true` if this value cannot satisfy a template placeholder:
    /// it is `Absent` or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            HeaderValue::Absent => true,
            HeaderValue::Text(s) => s.is_empty(),
            HeaderValue::Boolean(_) | HeaderValue::Integer(_) | HeaderValue::Float(_) => false,
        }
    }

    /// Borrow the string content of a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            HeaderValue::Text(_) => "text",
            HeaderValue::Boolean(_) => "boolean",
            HeaderValue::Integer(_) => "integer",
            HeaderValue::Float(_) => "float",
            HeaderValue::Absent => "absent",
        }
    }
}

impl std::fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderValue::Text(s) => write!(f, "{s}"),
            HeaderValue::Boolean(b) => write!(f, "{b}"),
            HeaderValue::Integer(n) => write!(f, "{n}"),
            HeaderValue::Float(v) => write!(f, "{v:.6}"),
            HeaderValue::Absent => Ok(()),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        HeaderValue::Text(String::from(s))
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        HeaderValue::Text(s)
    }
}

impl From<bool> for HeaderValue {
    fn from(b: bool) -> Self {
        HeaderValue::Boolean(b)
    }
}

impl From<i64> for HeaderValue {
    fn from(n: i64) -> Self {
        HeaderValue::Integer(n)
    }
}

impl From<f64> for HeaderValue {
    fn from(v: f64) -> Self {
        HeaderValue::Float(v)
    }
}

/// Keyword → value map decoded from one file's header.
///
/// Keywords are case-sensitive. A keyword mapped to [`HeaderValue::Absent`]
/// behaves exactly like a keyword that was never inserted for every lookup
/// through [`HeaderMap::present`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: BTreeMap<String, HeaderValue>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyword, replacing any earlier value for it.
    pub fn insert(&mut self, keyword: impl Into<String>, value: HeaderValue) {
        self.entries.insert(keyword.into(), value);
    }

    /// Raw lookup, including explicit `Absent` entries.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.entries.get(keyword)
    }

    /// Lookup that treats `Absent` as missing.
    pub fn present(&self, keyword: &str) -> Option<&HeaderValue> {
        self.entries.get(keyword).filter(|v| !v.is_absent())
    }

    pub fn contains_key(&self, keyword: &str) -> bool {
        self.entries.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in keyword order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, HeaderValue)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, HeaderValue)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
