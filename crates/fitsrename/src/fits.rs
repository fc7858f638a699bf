//! Primary-header extraction from FITS files.

use std::io::Read;

use tracing::debug;

use crate::block::{cards, read_block, BLOCK_SIZE};
use crate::card::{parse_card, Card, CardValue};
use crate::error::DecodeError;
use crate::value::{HeaderMap, HeaderValue};

/// Reads the primary header of a FITS stream.
///
/// The decoder owns its reader and [`FitsDecoder::read_header`] consumes it,
/// so the underlying file is closed as soon as the header has been read or
/// an error is returned.
#[derive(Debug)]
pub struct FitsDecoder<R> {
    reader: R,
}

impl<R: Read> FitsDecoder<R> {
    pub fn new(reader: R) -> Self {
        FitsDecoder { reader }
    }

    /// Read header blocks up to and including the END card.
    ///
    /// Data units and extension HDUs that follow are never read.
    pub fn read_cards(mut self) -> Result<Vec<Card>, DecodeError> {
        let mut block = [0u8; BLOCK_SIZE];
        let mut out = Vec::new();

        loop {
            read_block(&mut self.reader, &mut block)?;
            for card_bytes in cards(&block) {
                let card = parse_card(card_bytes)?;
                if card.is_end() {
                    return Ok(out);
                }
                out.push(card);
            }
        }
    }

    /// Decode the primary header into a [`HeaderMap`].
    pub fn read_header(self) -> Result<HeaderMap, DecodeError> {
        let cards = self.read_cards()?;
        let mut map = HeaderMap::new();

        for card in cards {
            if card.is_commentary() || !card.indicator {
                continue;
            }
            let keyword = String::from(card.keyword_str());
            let value = coerce(&keyword, card.value)?;
            map.insert(keyword, value);
        }

        debug!(keywords = map.len(), "decoded FITS header");
        Ok(map)
    }
}

/// Map a native card value onto the header value model.
fn coerce(keyword: &str, value: Option<CardValue>) -> Result<HeaderValue, DecodeError> {
    match value {
        None => Ok(HeaderValue::Absent),
        Some(CardValue::String(s)) => Ok(HeaderValue::Text(s)),
        Some(CardValue::Logical(b)) => Ok(HeaderValue::Boolean(b)),
        Some(CardValue::Integer(n)) => Ok(HeaderValue::Integer(n)),
        Some(CardValue::Float(f)) => Ok(HeaderValue::Float(f)),
        Some(other @ (CardValue::ComplexInt(..) | CardValue::ComplexFloat(..))) => {
            Err(DecodeError::UnsupportedValueType {
                keyword: String::from(keyword),
                kind: other.kind(),
            })
        }
    }
}

/// Decode the primary header of a FITS stream.
pub fn decode_flat_header<R: Read>(reader: R) -> Result<HeaderMap, DecodeError> {
    FitsDecoder::new(reader).read_header()
}
