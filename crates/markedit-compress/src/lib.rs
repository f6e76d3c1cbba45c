//! markedit Compress
//!
//! Huffman codec for document text. A packed stream is laid out as:
//!
//! ```text
//! 0xAA │ length: u64 BE │ code tree (pre-order) │ code bits, MSB first, zero-padded
//! ```
//!
//! The tree is written as bit `1` plus the symbol byte for a leaf and bit `0`
//! for an internal node. Empty text packs to the header alone.

pub mod bits;
pub mod huffman;

use std::string::FromUtf8Error;

use tracing::{debug, instrument};

use bits::{BitReader, BitWriter};
use huffman::CodeTree;

/// First byte of every packed stream.
pub const SIGNATURE: u8 = 0xAA;

/// Decoding error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompressError {
    #[error("Compress error: not a packed stream (first byte {found:#04x})")]
    BadSignature { found: u8 },

    #[error("Compress error: stream ends early")]
    Truncated,

    #[error("Compress error: code tree has too many nodes")]
    TreeTooLarge,

    #[error("Compress error: decoded bytes are not UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),
}

/// Pack `text`.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn encode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut w = BitWriter::new();
    w.write_byte(SIGNATURE);
    for b in (bytes.len() as u64).to_be_bytes() {
        w.write_byte(b);
    }

    let mut freqs = [0u64; 256];
    for &b in bytes {
        freqs[usize::from(b)] += 1;
    }

    if let Some(tree) = CodeTree::from_frequencies(&freqs) {
        tree.write(&mut w);
        let codes = tree.codes();
        for &b in bytes {
            if let Some(code) = &codes[usize::from(b)] {
                w.write_bits(code);
            }
        }
    }

    let packed = w.finish();
    debug!(packed = packed.len(), "encoded");
    packed
}

/// Unpack a stream produced by [`encode`].
#[instrument(level = "debug", skip(data), fields(len = data.len()))]
pub fn decode(data: &[u8]) -> Result<String, CompressError> {
    let mut r = BitReader::new(data);

    let found = r.read_byte()?;
    if found != SIGNATURE {
        return Err(CompressError::BadSignature { found });
    }

    let mut len = [0u8; 8];
    for b in &mut len {
        *b = r.read_byte()?;
    }
    let len = u64::from_be_bytes(len);
    if len == 0 {
        return Ok(String::new());
    }

    let tree = CodeTree::read(&mut r)?;

    // Every symbol costs at least one bit.
    if len > r.remaining() as u64 {
        return Err(CompressError::Truncated);
    }

    let mut out = Vec::with_capacity(len as usize);
    for _ in 0..len {
        out.push(tree.decode_symbol(&mut r)?);
    }
    Ok(String::from_utf8(out)?)
}

/// Packed size over original size; `0.0` for empty input.
pub fn ratio(original: usize, packed: usize) -> f64 {
    if original == 0 {
        0.0
    } else {
        packed as f64 / original as f64
    }
}
