//! Error types for RDES compression and decompression.

use thiserror::Error;

/// Error returned when a row cannot be written
///
/// Rows are validated as a whole before anything is emitted, so a failed
/// write leaves the compressor untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WriteError {
    /// Row length differs from the configured column count
    #[error("row has {actual} values, expected {expected}")]
    ColumnCount { expected: usize, actual: usize },

    /// Value does not fit in 31 bits
    #[error("value {value} in column {column} exceeds the 31-bit range")]
    ValueOutOfRange { column: usize, value: i64 },

    /// Signed value cannot be shifted into the unsigned range
    #[error("signed value {value} in column {column} is outside the encodable range")]
    SignedOutOfRange { column: usize, value: i64 },
}

/// Error returned when a byte stream cannot be decoded
///
/// A stream is unusable from the point of failure onward; there is no resync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The value starting at `offset` needs more bytes than are available
    #[error("stream truncated at byte {offset}: value needs {needed} bytes, {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Input ended between two columns of a row
    ///
    /// The row-level counterpart of [`TruncatedStream`](Self::TruncatedStream):
    /// every value arrived whole but the last row is missing columns. Callers
    /// treating truncation as recoverable (more bytes may follow) should handle
    /// both kinds.
    #[error("stream ended mid-row at column {column} of {columns}")]
    IncompleteRow { column: usize, columns: usize },

    /// Applying a delta left the 31-bit range (corrupt or mismatched stream)
    #[error("value at byte {offset} for column {column} decodes to {value}, outside the 31-bit range")]
    ValueOutOfRange { offset: usize, column: usize, value: i64 },

    /// Framed stream does not start with a valid header
    #[error("invalid stream header")]
    InvalidHeader,

    /// Framed stream was produced with a different configuration
    #[error("stream {field} is {actual}, decoder expects {expected}")]
    ConfigMismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// The decoding configuration itself is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error returned when a codec configuration is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variant number other than 1, 2 or 3
    #[error("unknown RDES variant {0}, expected 1, 2 or 3")]
    UnknownVariant(u8),

    /// Variant name that does not parse
    #[error("unknown RDES variant '{0}'")]
    UnknownVariantName(String),

    /// Zero columns configured
    #[error("at least one column is required")]
    NoColumns,

    /// Framed streams store the column count in 16 bits
    #[error("{0} columns exceed the framed header limit of 65535")]
    TooManyColumns(usize),

    /// Signed column index past the last column
    #[error("signed column {column} is out of range for {columns} columns")]
    SignedColumnOutOfRange { column: usize, columns: usize },
}

/// Error returned when a size metric has no meaningful value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricError {
    /// Compression ratio requested before any compressed bytes exist
    #[error("compression ratio is undefined: no compressed data")]
    NoCompressedData,
}
