//! Frame type classification from `IMAGETYP` / `FRAME`.

use std::fmt;

use crate::value::{HeaderMap, HeaderValue};

/// Calibration role of an exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Light,
    Dark,
    Flat,
    Bias,
}

impl FrameType {
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Light => "light",
            FrameType::Dark => "dark",
            FrameType::Flat => "flat",
            FrameType::Bias => "bias",
        }
    }

    /// Map an `IMAGETYP`/`FRAME` value. Matching is exact.
    pub fn from_image_type(text: &str) -> Option<FrameType> {
        match text {
            "Light Frame" | "Tricolor Image" | "Light" | "LIGHT" => Some(FrameType::Light),
            "Dark Frame" | "Dark" | "DARK" => Some(FrameType::Dark),
            "Flat Frame" | "Flat" | "FLAT" => Some(FrameType::Flat),
            "Bias Frame" | "Bias" | "BIAS" => Some(FrameType::Bias),
            _ => None,
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Why a header could not be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unclassified {
    /// Neither `IMAGETYP` nor `FRAME` carries a value.
    Missing,
    /// The frame keyword holds a non-string value.
    NotText,
    /// The frame keyword holds a string outside the known spellings.
    Unknown(String),
}

impl fmt::Display for Unclassified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unclassified::Missing => write!(f, "missing IMAGETYP and FRAME header"),
            Unclassified::NotText => write!(f, "IMAGETYP or FRAME header is not a string value"),
            Unclassified::Unknown(text) => write!(f, "unknown IMAGETYP or FRAME {text}"),
        }
    }
}

/// Classify a header. `IMAGETYP` takes precedence over `FRAME`.
pub fn classify(header: &HeaderMap) -> Result<FrameType, Unclassified> {
    let value = header
        .present("IMAGETYP")
        .or_else(|| header.present("FRAME"))
        .ok_or(Unclassified::Missing)?;

    match value {
        HeaderValue::Text(text) => {
            FrameType::from_image_type(text).ok_or_else(|| Unclassified::Unknown(text.clone()))
        }
        _ => Err(Unclassified::NotText),
    }
}
