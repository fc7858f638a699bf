//! Placeholder resolution against a header plus user-supplied defaults,
//! overrides, and keyword aliases.

use std::collections::HashMap;

use crate::error::{Error, RenderError, Result};
use crate::value::{HeaderMap, HeaderValue};

/// Read-only lookup tables consulted for every placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Used when a keyword is missing from the header or has no value.
    pub defaults: HashMap<String, String>,
    /// Replace the header value unconditionally.
    pub overrides: HashMap<String, String>,
    /// Fallback keywords tried, in order, when a keyword resolves to nothing.
    pub aliases: HashMap<String, Vec<String>>,
}

impl ResolutionContext {
    /// An empty context with the built-in alias table.
    pub fn new() -> Self {
        ResolutionContext {
            aliases: standard_aliases(),
            ..Default::default()
        }
    }

    pub fn with_defaults(mut self, defaults: HashMap<String, String>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_alias(mut self, keyword: impl Into<String>, fallbacks: &[&str]) -> Self {
        self.aliases.insert(
            keyword.into(),
            fallbacks.iter().map(|s| String::from(*s)).collect(),
        );
        self
    }

    /// Resolve one keyword.
    ///
    /// The header value wins unless it is absent, in which case the default
    /// is used; an override always wins. If the result is still missing or
    /// an empty string, the keyword's aliases are tried in order.
    pub fn resolve(&self, keyword: &str, header: &HeaderMap) -> std::result::Result<HeaderValue, RenderError> {
        let mut value = header
            .present(keyword)
            .cloned()
            .or_else(|| self.defaults.get(keyword).map(|s| HeaderValue::from(s.as_str())));

        if let Some(over) = self.overrides.get(keyword) {
            value = Some(HeaderValue::from(over.as_str()));
        }

        if value.as_ref().map_or(true, HeaderValue::is_empty) {
            if let Some(found) = self.resolve_alias(keyword, header) {
                value = Some(found);
            }
        }

        match value {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(RenderError::MissingRequiredHeader(String::from(keyword))),
        }
    }

    fn resolve_alias(&self, keyword: &str, header: &HeaderMap) -> Option<HeaderValue> {
        self.aliases.get(keyword)?.iter().find_map(|alias| {
            header
                .present(alias)
                .filter(|v| !v.is_empty())
                .cloned()
                .or_else(|| {
                    self.defaults
                        .get(alias)
                        .filter(|s| !s.is_empty())
                        .map(|s| HeaderValue::from(s.as_str()))
                })
        })
    }
}

/// Resolve `keyword` against `header` and `ctx`.
pub fn resolve(
    keyword: &str,
    header: &HeaderMap,
    ctx: &ResolutionContext,
) -> std::result::Result<HeaderValue, RenderError> {
    ctx.resolve(keyword, header)
}

/// Aliases applied by default: `EXPTIME` falls back to `EXPOSURE`.
pub fn standard_aliases() -> HashMap<String, Vec<String>> {
    HashMap::from([(String::from("EXPTIME"), vec![String::from("EXPOSURE")])])
}

/// Parse `KEY=VALUE;KEY=VALUE` into a map.
///
/// Empty segments (a trailing `;`) are ignored. A segment without exactly
/// one `=` is a configuration error. Later pairs replace earlier ones.
pub fn parse_assignments(input: &str) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for pair in input.split(';').filter(|p| !p.is_empty()) {
        let mut parts = pair.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.is_empty() => {
                map.insert(String::from(key), String::from(value));
            }
            _ => {
                return Err(Error::Config(format!(
                    "expected KEY=VALUE, got {pair:?}"
                )))
            }
        }
    }
    Ok(map)
}
