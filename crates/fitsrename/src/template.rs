//! Filename templates: `{KEYWORD}` and `{KEYWORD:format}` placeholders mixed
//! with literal text.
//!
//! There is no escape syntax for literal braces. A `{` with no `}` after it
//! is kept as literal text; a `{` inside a placeholder body becomes part of
//! the keyword.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One segment of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Text copied verbatim into the output.
    Literal(String),
    /// A header lookup, optionally with a format specifier.
    Placeholder {
        keyword: String,
        format: Option<String>,
    },
}

impl Token {
    pub fn literal(text: impl Into<String>) -> Self {
        Token::Literal(text.into())
    }

    pub fn placeholder(keyword: impl Into<String>, format: Option<&str>) -> Self {
        Token::Placeholder {
            keyword: keyword.into(),
            format: format.map(String::from),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::Placeholder {
                keyword,
                format: None,
            } => write!(f, "{{{keyword}}}"),
            Token::Placeholder {
                keyword,
                format: Some(format),
            } => write!(f, "{{{keyword}:{format}}}"),
        }
    }
}

/// Split a template string into literal and placeholder tokens.
pub fn tokenize(data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let rest = &data[i..];
        let open = rest.find('{');
        let close = rest.find('}');

        match (open, close) {
            (Some(0), Some(end)) => {
                let body = &rest[1..end];
                tokens.push(match body.split_once(':') {
                    Some((keyword, format)) => Token::placeholder(keyword, Some(format)),
                    None => Token::placeholder(body, None),
                });
                i += end + 1;
            }
            (Some(start), _) if start > 0 => {
                tokens.push(Token::literal(&rest[..start]));
                i += start;
            }
            _ => {
                tokens.push(Token::literal(rest));
                break;
            }
        }
    }

    tokens
}

/// A tokenized template, parsed once and rendered for many headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    tokens: Vec<Token>,
}

impl Template {
    pub fn parse(format: &str) -> Self {
        Template {
            tokens: tokenize(format),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Keywords referenced by placeholders, in template order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Placeholder { keyword, .. } => Some(keyword.as_str()),
            Token::Literal(_) => None,
        })
    }
}

impl FromStr for Template {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Template::parse(s))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
