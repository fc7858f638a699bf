use std::io::{ErrorKind, Read};

use crate::error::DecodeError;

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Reads exactly one 2880-byte block from `src` into `dest`.
///
/// A source that ends mid-block (or before the block starts) yields
/// [`DecodeError::UnexpectedEof`].
pub fn read_block<R: Read>(src: &mut R, dest: &mut [u8; BLOCK_SIZE]) -> Result<(), DecodeError> {
    src.read_exact(dest).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DecodeError::UnexpectedEof,
        _ => DecodeError::Io(e),
    })
}

/// Iterate over the 36 cards of a block.
pub fn cards(block: &[u8; BLOCK_SIZE]) -> impl Iterator<Item = &[u8; CARD_SIZE]> {
    block
        .chunks_exact(CARD_SIZE)
        .filter_map(|chunk| <&[u8; CARD_SIZE]>::try_from(chunk).ok())
}
