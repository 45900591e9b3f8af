//! Streaming RDES decompressor.
//!
//! Decoding walks the byte stream one value at a time:
//!
//! 1. read the lead byte; bit 8 tells raw from delta
//! 2. the variant's selector bits give the value's byte count
//! 3. the magnitude (or raw value) is assembled from those bytes
//! 4. the column's stored reference is updated with the unsigned result,
//!    which is re-signed for output if the column is signed
//! 5. the column cursor advances; wrapping to 0 completes a row
//!
//! Column references and the cursor survive between calls, so a stream can be
//! decoded piecewise as long as every byte is delivered once, in order.

use std::mem;

use log::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{ConfigError, DecodeError, MetricError};
use crate::header::StreamHeader;
use crate::signed::resignify;
use crate::stats::SizeStats;
use crate::variant::{DeltaCodec, Encoded, Incomplete, Variant};

/// One decoded row; signed columns hold re-signed values
pub type Row = Vec<i64>;

/// Decoder state that must persist between calls
#[derive(Debug, Clone)]
struct StreamState {
    /// Last unsigned value per column
    last_values: Vec<u32>,
    /// Values of the row being assembled
    row: Row,
    /// Bytes of a value (or header) that has not fully arrived
    pending: Vec<u8>,
    /// Stream offset of the first pending byte
    offset: usize,
    header_seen: bool,
}

impl StreamState {
    fn new(columns: usize) -> Self {
        Self {
            last_values: vec![0; columns],
            row: Vec::with_capacity(columns),
            pending: Vec::new(),
            offset: 0,
            header_seen: false,
        }
    }

    /// Column the next value belongs to
    #[inline]
    fn column(&self) -> usize {
        self.row.len()
    }
}

/// Decompressor for streams produced by [`Compressor`](crate::Compressor)
///
/// Must be built with the same variant, column count and (for framed streams)
/// signed-column set as the compressor; unframed streams cannot detect a
/// mismatch and will decode to wrong values.
#[derive(Debug, Clone)]
pub struct Decompressor {
    config: CodecConfig,
    codec: &'static dyn DeltaCodec,
    state: StreamState,
    /// Metrics of the most recent call
    last_call: SizeStats,
}

impl Decompressor {
    /// Create a decompressor
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            codec: config.variant.codec(),
            state: StreamState::new(config.columns),
            last_call: SizeStats {
                rows: 0,
                columns: config.columns,
                compressed: 0,
            },
            config,
        })
    }

    /// Unframed decompressor with no signed columns
    ///
    /// # Errors
    /// Returns an error if `columns` is zero.
    pub fn with_variant(variant: Variant, columns: usize) -> Result<Self, ConfigError> {
        Self::new(CodecConfig::new(variant, columns))
    }

    /// Configuration this decompressor was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a run of complete rows
    ///
    /// `bytes` must continue the stream exactly where the previous call left
    /// off and end on a row boundary.
    ///
    /// # Errors
    /// * [`DecodeError::TruncatedStream`] if the last value is cut short
    /// * [`DecodeError::IncompleteRow`] if the input ends between columns
    /// * [`DecodeError::ValueOutOfRange`] if a delta leaves the 31-bit range
    /// * [`DecodeError::InvalidHeader`] / [`DecodeError::ConfigMismatch`] for framed streams
    ///
    /// On error the decompressor is left as it was before the call.
    pub fn decompress(&mut self, bytes: &[u8]) -> Result<Vec<Row>, DecodeError> {
        let mut state = self.state.clone();
        let mut rows = Vec::new();
        self.advance(&mut state, bytes, &mut rows)?;
        self.check_complete(&state)?;
        self.commit(state, &rows, bytes.len());
        Ok(rows)
    }

    /// Decode whatever complete rows `bytes` finishes
    ///
    /// Unlike [`decompress`](Self::decompress), the input may stop anywhere:
    /// a partial value is buffered and a partial row is carried over until
    /// later calls supply the rest. Call [`finish`](Self::finish) once the
    /// stream has ended.
    ///
    /// # Errors
    /// * [`DecodeError::ValueOutOfRange`] if a delta leaves the 31-bit range
    /// * [`DecodeError::InvalidHeader`] / [`DecodeError::ConfigMismatch`] for framed streams
    ///
    /// On error the decompressor is left as it was before the call.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Row>, DecodeError> {
        let mut state = self.state.clone();
        let mut rows = Vec::new();
        self.advance(&mut state, bytes, &mut rows)?;
        self.commit(state, &rows, bytes.len());
        Ok(rows)
    }

    /// Confirm the stream ended cleanly on a row boundary
    ///
    /// # Errors
    /// * [`DecodeError::TruncatedStream`] if buffered bytes never formed a full value
    /// * [`DecodeError::IncompleteRow`] if a row was left unfinished
    pub fn finish(&self) -> Result<(), DecodeError> {
        self.check_complete(&self.state)
    }

    /// Forget all stream state, ready for a new stream
    pub fn reset(&mut self) {
        debug!("{}: decoder reset at byte {}", self.config.variant, self.state.offset);
        self.state = StreamState::new(self.config.columns);
        self.last_call = SizeStats {
            rows: 0,
            columns: self.config.columns,
            compressed: 0,
        };
    }

    /// Column the next decoded value will belong to
    #[inline]
    #[must_use]
    pub fn column_cursor(&self) -> usize {
        self.state.column()
    }

    /// Metrics of the most recent `decompress` or `feed` call
    #[inline]
    #[must_use]
    pub fn stats(&self) -> SizeStats {
        self.last_call
    }

    /// Rows from the most recent call as plain 4-byte integers
    #[inline]
    #[must_use]
    pub fn uncompressed_size(&self) -> u64 {
        self.last_call.uncompressed_size()
    }

    /// Bytes given to the most recent call
    #[inline]
    #[must_use]
    pub fn compressed_size(&self) -> usize {
        self.last_call.compressed_size()
    }

    /// Compression ratio of the most recent call
    ///
    /// # Errors
    /// Returns [`MetricError::NoCompressedData`] if that call received no bytes.
    pub fn compression_ratio(&self) -> Result<f64, MetricError> {
        self.last_call.compression_ratio()
    }

    fn commit(&mut self, state: StreamState, rows: &[Row], len: usize) {
        self.state = state;
        self.last_call = SizeStats {
            rows: rows.len() as u64,
            columns: self.config.columns,
            compressed: len,
        };
    }

    /// Decode as much of `pending + bytes` as possible into `rows`
    fn advance(&self, state: &mut StreamState, bytes: &[u8], rows: &mut Vec<Row>) -> Result<(), DecodeError> {
        let joined;
        let data: &[u8] = if state.pending.is_empty() {
            bytes
        } else {
            let mut buf = mem::take(&mut state.pending);
            buf.extend_from_slice(bytes);
            joined = buf;
            &joined
        };

        let mut pos = 0;
        if self.config.framed && !state.header_seen {
            if data.is_empty() {
                return Ok(());
            }
            match StreamHeader::read(data) {
                Ok((header, len)) => {
                    header.verify(&self.config)?;
                    debug!("{}: stream header accepted ({len} bytes)", self.config.variant);
                    state.header_seen = true;
                    pos = len;
                }
                Err(DecodeError::TruncatedStream { .. }) => {
                    state.pending = data.to_vec();
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        while pos < data.len() {
            let (encoded, used) = match self.codec.decode(&data[pos..]) {
                Ok(decoded) => decoded,
                Err(Incomplete { .. }) => break,
            };
            let offset = state.offset + pos;
            let column = state.column();
            let last = state.last_values[column];
            let stored = encoded.resolve(last).ok_or_else(|| DecodeError::ValueOutOfRange {
                offset,
                column,
                value: match encoded {
                    Encoded::Raw(v) => i64::from(v),
                    Encoded::Delta { delta, .. } => i64::from(last) + delta.signed(),
                },
            })?;
            trace!("{}: byte {offset}, column {column}: {encoded:?} -> {stored}", self.config.variant);

            state.last_values[column] = stored;
            state.row.push(if self.config.is_signed(column) {
                resignify(stored)
            } else {
                i64::from(stored)
            });
            if state.row.len() == self.config.columns {
                rows.push(mem::replace(&mut state.row, Vec::with_capacity(self.config.columns)));
            }
            pos += used;
        }

        state.offset += pos;
        state.pending = data[pos..].to_vec();
        Ok(())
    }

    fn check_complete(&self, state: &StreamState) -> Result<(), DecodeError> {
        if let Some(&lead) = state.pending.first() {
            let needed = if self.config.framed && !state.header_seen {
                match StreamHeader::read(&state.pending) {
                    Err(DecodeError::TruncatedStream { needed, .. }) => needed,
                    Err(e) => return Err(e),
                    Ok((header, _)) => header.len(),
                }
            } else {
                self.codec.value_len(lead)
            };
            return Err(DecodeError::TruncatedStream {
                offset: state.offset,
                needed,
                available: state.pending.len(),
            });
        }
        if state.column() != 0 {
            return Err(DecodeError::IncompleteRow {
                column: state.column(),
                columns: self.config.columns,
            });
        }
        Ok(())
    }
}
