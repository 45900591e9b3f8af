//! Value-by-value breakdown of a compressed stream, for debugging and tooling.

use crate::config::CodecConfig;
use crate::error::DecodeError;
use crate::header::StreamHeader;
use crate::variant::{Encoded, Incomplete};

/// One value as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    /// Byte offset of the lead byte
    pub offset: usize,
    /// Row index, counted from the start of `bytes`
    pub row: usize,
    /// Column index
    pub column: usize,
    /// Layout chosen for the value
    pub encoded: Encoded,
    /// Unsigned value after applying the layout (before any re-signing)
    pub value: u32,
    /// The value's bytes
    pub bytes: Vec<u8>,
}

/// Break a complete stream into its encoded values
///
/// For framed configurations the header is parsed and checked first.
///
/// # Errors
/// * [`DecodeError::Config`] if `config` is invalid, where
///   [`Decompressor::new`](crate::Decompressor::new) would refuse it
/// * otherwise the same failures as
///   [`Decompressor::decompress`](crate::Decompressor::decompress) on a fresh decompressor
pub fn inspect(config: &CodecConfig, bytes: &[u8]) -> Result<Vec<EncodedValue>, DecodeError> {
    config.validate()?;
    let codec = config.variant.codec();
    let mut last_values = vec![0u32; config.columns];
    let mut values = Vec::new();

    let mut pos = 0;
    if config.framed && !bytes.is_empty() {
        let (header, len) = StreamHeader::read(bytes)?;
        header.verify(config)?;
        pos = len;
    }

    let mut index = 0usize;
    while pos < bytes.len() {
        let (encoded, used) = codec.decode(&bytes[pos..]).map_err(|Incomplete { needed }| {
            DecodeError::TruncatedStream {
                offset: pos,
                needed,
                available: bytes.len() - pos,
            }
        })?;
        let column = index % config.columns;
        let last = last_values[column];
        let value = encoded.resolve(last).ok_or(DecodeError::ValueOutOfRange {
            offset: pos,
            column,
            value: match encoded {
                Encoded::Raw(v) => i64::from(v),
                Encoded::Delta { delta, .. } => i64::from(last) + delta.signed(),
            },
        })?;
        last_values[column] = value;
        values.push(EncodedValue {
            offset: pos,
            row: index / config.columns,
            column,
            encoded,
            value,
            bytes: bytes[pos..pos + used].to_vec(),
        });
        index += 1;
        pos += used;
    }

    let column = index % config.columns;
    if column != 0 {
        return Err(DecodeError::IncompleteRow {
            column,
            columns: config.columns,
        });
    }
    Ok(values)
}
