//! Rendering tokens into a filename.

use tracing::trace;

use crate::error::RenderError;
use crate::layout::{format_timestamp, parse_timestamp};
use crate::printf::{sprintf, Arg};
use crate::resolve::ResolutionContext;
use crate::template::{Template, Token};
use crate::value::{HeaderMap, HeaderValue};

/// What to do with spaces inside rendered placeholder values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpacePolicy {
    #[default]
    Keep,
    /// Replace each space with `_`. Literal template text is untouched.
    Underscore,
}

impl SpacePolicy {
    fn apply(self, text: String) -> String {
        match self {
            SpacePolicy::Keep => text,
            SpacePolicy::Underscore => text.replace(' ', "_"),
        }
    }
}

/// Render every token in order and concatenate the results.
pub fn render(
    tokens: &[Token],
    header: &HeaderMap,
    ctx: &ResolutionContext,
    spaces: SpacePolicy,
) -> Result<String, RenderError> {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Placeholder { keyword, format } => {
                let value = ctx.resolve(keyword, header)?;
                let format = format.as_deref().unwrap_or("");
                let rendered = render_value(keyword, &value, format)?;
                trace!(keyword = %keyword, value = %rendered, "rendered placeholder");
                out.push_str(&spaces.apply(rendered));
            }
        }
    }
    Ok(out)
}

impl Template {
    /// Render this template for one header.
    pub fn render(
        &self,
        header: &HeaderMap,
        ctx: &ResolutionContext,
        spaces: SpacePolicy,
    ) -> Result<String, RenderError> {
        render(self.tokens(), header, ctx, spaces)
    }
}

/// Render a resolved value with an optional format (`""` for none).
pub fn render_value(keyword: &str, value: &HeaderValue, format: &str) -> Result<String, RenderError> {
    let invalid = |reason: String| RenderError::InvalidFormat {
        keyword: String::from(keyword),
        format: String::from(format),
        reason,
    };
    let printf = |arg: Arg| sprintf(format, arg).map_err(|e| invalid(e.to_string()));

    match value {
        HeaderValue::Text(text) => match format.strip_prefix("date") {
            Some(layout) => {
                let ts = parse_timestamp(text).ok_or_else(|| RenderError::TimestampParse {
                    keyword: String::from(keyword),
                    value: text.clone(),
                })?;
                if format == "dateunix" {
                    Ok(ts.timestamp().to_string())
                } else {
                    format_timestamp(&ts, layout).map_err(invalid)
                }
            }
            None => Ok(String::from(text.trim())),
        },
        HeaderValue::Boolean(b) if format.is_empty() => Ok(b.to_string()),
        HeaderValue::Boolean(b) => printf(Arg::Bool(*b)),
        HeaderValue::Integer(n) if format.is_empty() => Ok(n.to_string()),
        HeaderValue::Integer(n) if mentions_after_start(format, 'f') => printf(Arg::Float(*n as f64)),
        HeaderValue::Integer(n) => printf(Arg::Int(*n)),
        HeaderValue::Float(v) if format.is_empty() => {
            sprintf("%f", Arg::Float(*v)).map_err(|e| invalid(e.to_string()))
        }
        HeaderValue::Float(v) if mentions_after_start(format, 'd') => printf(Arg::Int(v.trunc() as i64)),
        HeaderValue::Float(v) => printf(Arg::Float(*v)),
        HeaderValue::Absent => Err(RenderError::MissingRequiredHeader(String::from(keyword))),
    }
}

/// The first occurrence of `c` exists and is not the first character.
///
/// Decides integer/float conversion: `%0.2f` on an integer formats it as a
/// float, `%03d` on a float truncates it first.
fn mentions_after_start(format: &str, c: char) -> bool {
    format.find(c).is_some_and(|i| i > 0)
}
