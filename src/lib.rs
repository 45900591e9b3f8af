//! `rdes` - lossless delta encoding for tables of slowly-changing integers
//!
//! RDES shrinks streams of 31-bit unsigned readings (sensor channels,
//! telemetry counters) organised into fixed columns. Each value is stored as
//! a signed offset from the previous value in its column, using the fewest
//! bytes that can hold the offset's magnitude.
//!
//! # Example
//! ```
//! use rdes::{CodecConfig, Compressor, Decompressor, Variant};
//!
//! let config = CodecConfig::new(Variant::Rdes2, 2).with_signed_columns([1]);
//! let mut comp = Compressor::new(config.clone()).unwrap();
//!
//! // Column 0 is unsigned, column 1 holds signed temperatures
//! comp.write_signed_row(&[1_000, -12]).unwrap();
//! comp.write_signed_row(&[1_010, -11]).unwrap();
//! comp.write_signed_row(&[1_004, -15]).unwrap();
//!
//! let bytes = comp.compressed_data();
//! println!("{} bytes, ratio {:.2}", bytes.len(), comp.compression_ratio().unwrap());
//!
//! let mut deco = Decompressor::new(config).unwrap();
//! let rows = deco.decompress(bytes).unwrap();
//! assert_eq!(rows, vec![vec![1_000, -12], vec![1_010, -11], vec![1_004, -15]]);
//! ```
//!
//! # Wire Format
//!
//! A stream is a plain concatenation of values, column by column, row by row.
//! There is no header, length or delimiter: the variant, column count and
//! signed columns are agreed out-of-band (see [`CodecConfig`]).
//!
//! Bits are numbered 8 (MSB) to 1 (LSB). The lead byte of every value says
//! how long it is:
//!
//! | Bit 8 | Bit 7 | Meaning |
//! |-------|-------|---------|
//! | 0 | - | Raw value: this byte and the next 3, big-endian (31 bits) |
//! | 1 | 1 | Delta, value increased |
//! | 1 | 0 | Delta, value decreased |
//!
//! ## Delta levels
//!
//! | Variant | Lead byte | Bytes | Magnitude |
//! |---------|-----------|-------|-----------|
//! | RDES1 | `1sxxxxxx` | 3 | 22 bits |
//! | RDES2 | `1s0xxxxx` | 2 | 13 bits |
//! | RDES2 | `1s1xxxxx` | 3 | 21 bits |
//! | RDES3 | `1s0xxxxx` | 1 | 5 bits |
//! | RDES3 | `1s10xxxx` | 2 | 12 bits |
//! | RDES3 | `1s11xxxx` | 3 | 20 bits |
//!
//! `x` bits of the lead byte followed by every bit of the remaining bytes form
//! the magnitude, most significant first. An offset too large for the biggest
//! level is written as a raw value instead.
//!
//! ## Reference rows
//!
//! The first row of a stream is always raw. With a non-zero
//! `refresh_interval`, a raw row is also forced after that many consecutive
//! delta rows, limiting how far a corrupted byte can propagate.
//!
//! ## Signed columns
//!
//! Signed readings are shifted into the unsigned range by [`unsignify`]
//! (adds 536,870,911) and shifted back by [`resignify`]. Deltas are always
//! computed on the shifted value.
//!
//! ## Framed streams
//!
//! Setting [`CodecConfig::framed`] prefixes the stream with a
//! [`StreamHeader`] so a decoder with a different configuration fails with
//! [`DecodeError::ConfigMismatch`] instead of producing wrong values. Framed
//! streams are not readable by plain RDES decoders.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod bits;
mod config;
mod constants;
mod decoder;
mod encoder;
mod error;
mod header;
mod inspect;
mod signed;
mod stats;
mod variant;


// Re-export public API
pub use config::CodecConfig;
pub use constants::{RAW_VALUE_BYTES, RAW_VALUE_MAX, SIGN_OFFSET};
pub use decoder::{Decompressor, Row};
pub use encoder::Compressor;
pub use error::{ConfigError, DecodeError, MetricError, WriteError};
pub use header::StreamHeader;
pub use inspect::{inspect, EncodedValue};
pub use signed::{resignify, unsignify, SIGNED_MAX, SIGNED_MIN};
pub use stats::SizeStats;
pub use variant::{Delta, DeltaCodec, Encoded, Incomplete, Level, Rdes1, Rdes2, Rdes3, Variant};
