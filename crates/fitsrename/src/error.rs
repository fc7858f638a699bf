use std::path::PathBuf;

/// Structural errors raised while extracting a header from FITS or XISF data.
///
/// Any of these aborts decoding of the current file; no partial header map
/// is ever returned alongside one.
#[derive(Debug)]
pub enum DecodeError {
    /// The XISF signature was short or did not read `XISF0100`.
    InvalidSignature,
    /// The XISF length prefix, reserved bytes, or header payload were truncated.
    InvalidHeaderLength,
    /// A FITS header block ended before the END card.
    UnexpectedEof,
    /// Malformed keyword name in a FITS header card.
    InvalidKeyword,
    /// A FITS card was not valid ASCII text.
    InvalidHeader,
    /// A keyword carried a value kind outside the header value model.
    UnsupportedValueType {
        keyword: String,
        kind: &'static str,
    },
    /// A FITS value field that is neither blank nor a recognised value.
    InvalidValue { keyword: String, text: String },
    /// An integer-shaped value did not fit in 64 bits.
    IntegerOutOfRange { keyword: String, value: String },
    /// The XISF header payload was not a well-formed XISF XML document.
    XmlParse(String),
    /// An I/O error from the underlying reader.
    Io(std::io::Error),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::InvalidSignature => write!(f, "invalid XISF signature"),
            DecodeError::InvalidHeaderLength => write!(f, "invalid header length"),
            DecodeError::UnexpectedEof => write!(f, "unexpected end of file"),
            DecodeError::InvalidKeyword => write!(f, "invalid keyword name"),
            DecodeError::InvalidHeader => write!(f, "invalid FITS header"),
            DecodeError::UnsupportedValueType { keyword, kind } => {
                write!(f, "unsupported {kind} value for header {keyword}")
            }
            DecodeError::InvalidValue { keyword, text } => {
                write!(f, "unparseable value {text:?} for header {keyword}")
            }
            DecodeError::IntegerOutOfRange { keyword, value } => {
                write!(f, "integer value {value} for header {keyword} is out of range")
            }
            DecodeError::XmlParse(msg) => write!(f, "XML parse error: {msg}"),
            DecodeError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(e: std::io::Error) -> Self {
        DecodeError::Io(e)
    }
}

impl From<quick_xml::Error> for DecodeError {
    fn from(e: quick_xml::Error) -> Self {
        DecodeError::XmlParse(e.to_string())
    }
}

/// Errors raised while resolving and rendering a filename template.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// No header, default, override, or alias supplied a value.
    MissingRequiredHeader(String),
    /// A `date` format was applied to text that is not a timestamp.
    TimestampParse { keyword: String, value: String },
    /// A format specifier could not be applied to the resolved value.
    InvalidFormat {
        keyword: String,
        format: String,
        reason: String,
    },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingRequiredHeader(kw) => {
                write!(f, "file is missing header {kw}")
            }
            RenderError::TimestampParse { keyword, value } => {
                write!(f, "unable to parse {value} as a timestamp for header {keyword}")
            }
            RenderError::InvalidFormat {
                keyword,
                format,
                reason,
            } => write!(f, "invalid format {format:?} for header {keyword}: {reason}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// All errors surfaced by the rename pipeline.
#[derive(Debug)]
pub enum Error {
    /// A header could not be decoded.
    Decode(DecodeError),
    /// A filename could not be rendered.
    Render(RenderError),
    /// A failure tied to one input file.
    File { path: PathBuf, source: Box<Error> },
    /// Invalid user-supplied configuration.
    Config(String),
    /// A standard I/O error.
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Attach the offending file to this error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Render(e) => write!(f, "render error: {e}"),
            Error::File { path, source } => write!(f, "{}: {source}", path.display()),
            Error::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Render(e) => Some(e),
            Error::File { source, .. } => Some(source.as_ref()),
            Error::Config(_) => None,
            Error::Io(e) => Some(e),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<RenderError> for Error {
    fn from(e: RenderError) -> Self {
        Error::Render(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
