//! Row-by-row RDES compressor.

use log::{debug, trace};

use crate::bits::byte_to_str;
use crate::config::CodecConfig;
use crate::constants::{RAW_VALUE_BYTES, RAW_VALUE_MAX};
use crate::error::{ConfigError, MetricError, WriteError};
use crate::header::StreamHeader;
use crate::signed::unsignify;
use crate::stats::SizeStats;
use crate::variant::{write_raw, DeltaCodec, Encoded, Variant};

/// Compressor for a table of 31-bit unsigned values
///
/// Each column is delta-encoded against its own previous value. The first row
/// (and every row after `refresh_interval` delta rows) is written raw so the
/// decoder has an absolute reference.
///
/// # Example
/// ```
/// use rdes::{CodecConfig, Compressor, Decompressor, Variant};
///
/// let config = CodecConfig::new(Variant::Rdes3, 1);
/// let mut comp = Compressor::new(config.clone()).unwrap();
/// for v in [100, 105, 50_000, 50_000] {
///     comp.write_row(&[v]).unwrap();
/// }
/// assert_eq!(comp.compressed_size(), 9);
///
/// let mut deco = Decompressor::new(config).unwrap();
/// let rows = deco.decompress(comp.compressed_data()).unwrap();
/// assert_eq!(rows, vec![vec![100], vec![105], vec![50_000], vec![50_000]]);
/// ```
#[derive(Debug, Clone)]
pub struct Compressor {
    config: CodecConfig,
    codec: &'static dyn DeltaCodec,
    /// Written at the start of every stream when framed
    header: Option<StreamHeader>,
    /// Compressed output, header included when framed
    buf: Vec<u8>,
    /// Last raw value per column
    last_values: Vec<u32>,
    initialized: bool,
    rows_since_raw: u32,
    rows_written: u64,
}

impl Compressor {
    /// Create a compressor
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        Self::with_capacity(config, 0)
    }

    /// Unframed compressor with no signed columns and no raw refresh
    ///
    /// # Errors
    /// Returns an error if `columns` is zero.
    pub fn with_variant(variant: Variant, columns: usize) -> Result<Self, ConfigError> {
        Self::new(CodecConfig::new(variant, columns))
    }

    /// Create a compressor with room for `rows` raw-sized rows
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_capacity(config: CodecConfig, rows: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let header = if config.framed {
            Some(StreamHeader::from_config(&config)?)
        } else {
            None
        };
        let capacity = rows.saturating_mul(config.columns * RAW_VALUE_BYTES);
        let mut comp = Self {
            codec: config.variant.codec(),
            header,
            buf: Vec::with_capacity(capacity),
            last_values: vec![0; config.columns],
            initialized: false,
            rows_since_raw: 0,
            rows_written: 0,
            config,
        };
        comp.start_stream();
        Ok(comp)
    }

    /// Configuration this compressor was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Variant in use
    #[inline]
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.config.variant
    }

    /// Compress one row of unsigned values
    ///
    /// # Errors
    /// * [`WriteError::ColumnCount`] if `row` has the wrong length
    /// * [`WriteError::ValueOutOfRange`] if any value exceeds 2^31 - 1
    ///
    /// Nothing is written when an error is returned.
    pub fn write_row(&mut self, row: &[u32]) -> Result<(), WriteError> {
        self.check_row_len(row.len())?;
        if let Some((column, &value)) = row.iter().enumerate().find(|&(_, &v)| v > RAW_VALUE_MAX) {
            return Err(WriteError::ValueOutOfRange {
                column,
                value: i64::from(value),
            });
        }
        self.encode_row(row);
        Ok(())
    }

    /// Compress one row where signed columns hold signed values
    ///
    /// Signed columns are passed through [`unsignify`]; all others must be
    /// unsigned 31-bit values.
    ///
    /// # Errors
    /// * [`WriteError::ColumnCount`] if `row` has the wrong length
    /// * [`WriteError::SignedOutOfRange`] if a signed value cannot be shifted
    /// * [`WriteError::ValueOutOfRange`] if an unsigned value is negative or too large
    pub fn write_signed_row(&mut self, row: &[i64]) -> Result<(), WriteError> {
        self.check_row_len(row.len())?;
        let unsigned = row
            .iter()
            .enumerate()
            .map(|(column, &value)| {
                if self.config.is_signed(column) {
                    unsignify(value).ok_or(WriteError::SignedOutOfRange { column, value })
                } else {
                    u32::try_from(value)
                        .ok()
                        .filter(|&v| v <= RAW_VALUE_MAX)
                        .ok_or(WriteError::ValueOutOfRange {
                            column,
                            value,
                        })
                }
            })
            .collect::<Result<Vec<u32>, _>>()?;
        self.encode_row(&unsigned);
        Ok(())
    }

    /// All compressed bytes produced since construction or the last reset
    #[inline]
    #[must_use]
    pub fn compressed_data(&self) -> &[u8] {
        &self.buf
    }

    /// Owned copy of the compressed bytes
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buf.clone()
    }

    /// Drop all output and column state; the next row starts a new stream
    pub fn reset(&mut self) {
        debug!("{}: reset after {} rows", self.config.variant, self.rows_written);
        self.buf.clear();
        self.last_values.fill(0);
        self.initialized = false;
        self.rows_since_raw = 0;
        self.rows_written = 0;
        self.start_stream();
    }

    /// Rows written since construction or the last reset
    #[inline]
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Size and row counters
    #[inline]
    #[must_use]
    pub fn stats(&self) -> SizeStats {
        SizeStats {
            rows: self.rows_written,
            columns: self.config.columns,
            compressed: self.buf.len(),
        }
    }

    /// Bytes the written rows take as plain 4-byte integers
    #[inline]
    #[must_use]
    pub fn uncompressed_size(&self) -> u64 {
        self.stats().uncompressed_size()
    }

    /// Bytes of compressed output
    #[inline]
    #[must_use]
    pub fn compressed_size(&self) -> usize {
        self.buf.len()
    }

    /// Uncompressed size over compressed size
    ///
    /// # Errors
    /// Returns [`MetricError::NoCompressedData`] before anything has been written.
    pub fn compression_ratio(&self) -> Result<f64, MetricError> {
        self.stats().compression_ratio()
    }

    fn start_stream(&mut self) {
        if let Some(header) = &self.header {
            header.write(&mut self.buf);
        }
    }

    fn check_row_len(&self, len: usize) -> Result<(), WriteError> {
        if len == self.config.columns {
            Ok(())
        } else {
            Err(WriteError::ColumnCount {
                expected: self.config.columns,
                actual: len,
            })
        }
    }

    /// Encode a validated row
    fn encode_row(&mut self, row: &[u32]) {
        self.rows_written += 1;

        let refresh_due = self.config.refresh_interval > 0 && self.rows_since_raw >= self.config.refresh_interval;
        if !self.initialized || refresh_due {
            for &value in row {
                write_raw(value, &mut self.buf);
            }
            self.last_values.copy_from_slice(row);
            self.rows_since_raw = 0;
            if self.initialized {
                debug!("{}: origin refresh at row {}", self.config.variant, self.rows_written);
            } else {
                debug!("{}: initialized with {} columns", self.config.variant, self.config.columns);
            }
            self.initialized = true;
            return;
        }

        for (column, &value) in row.iter().enumerate() {
            let start = self.buf.len();
            let last = self.last_values[column];
            let encoded = self.codec.encode(last, value, &mut self.buf);
            if log::log_enabled!(log::Level::Trace) {
                let kind = match encoded {
                    Encoded::Raw(_) => "raw".to_owned(),
                    Encoded::Delta { delta, .. } => format!("delta {:+}", delta.signed()),
                };
                trace!(
                    "{}: column {column}: {last} -> {value}, {kind} in {} bytes, lead {}",
                    self.config.variant,
                    encoded.len(),
                    byte_to_str(self.buf[start])
                );
            }
            self.last_values[column] = value;
        }
        self.rows_since_raw += 1;
    }
}
