//! Optional self-describing stream header.
//!
//! Plain RDES streams rely on both ends sharing a [`CodecConfig`]; a mismatch
//! silently yields wrong values. Framed streams (`CodecConfig::framed`) start
//! with a header so the decoder can refuse a stream built with a different
//! configuration. The header is not part of the plain wire format.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `RDES` |
//! | 4 | 1 | format version (1) |
//! | 5 | 1 | variant (1, 2 or 3) |
//! | 6 | 2 | column count, big-endian |
//! | 8 | 2 | signed column count `k`, big-endian |
//! | 10 | 2k | signed column indexes, big-endian, ascending |

use crate::config::CodecConfig;
use crate::constants::{HEADER_FIXED_SIZE, HEADER_MAGIC, HEADER_VERSION};
use crate::error::{ConfigError, DecodeError};
use crate::variant::Variant;

/// Decoded stream header
///
/// Only built by [`from_config`](Self::from_config) or [`read`](Self::read),
/// so every field fits its 16-bit slot on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    variant: Variant,
    columns: u16,
    signed_columns: Vec<u16>,
}

impl StreamHeader {
    /// Header describing `config`
    ///
    /// # Errors
    /// Returns an error if `config` is invalid or has more columns than the
    /// header's 16-bit count can hold.
    pub fn from_config(config: &CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let columns = u16::try_from(config.columns).map_err(|_| ConfigError::TooManyColumns(config.columns))?;
        let signed_columns = config
            .signed_columns
            .iter()
            .map(|&c| u16::try_from(c).map_err(|_| ConfigError::TooManyColumns(config.columns)))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            variant: config.variant,
            columns,
            signed_columns,
        })
    }

    /// Variant the stream was written with
    #[inline]
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Values per row
    #[inline]
    #[must_use]
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// Signed column indexes, ascending
    #[inline]
    #[must_use]
    pub fn signed_columns(&self) -> &[u16] {
        &self.signed_columns
    }

    /// Encoded size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        HEADER_FIXED_SIZE + 2 * self.signed_columns.len()
    }

    /// Never empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Append the header bytes to `out`
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&HEADER_MAGIC);
        out.push(HEADER_VERSION);
        out.push(self.variant.number());
        out.extend_from_slice(&self.columns.to_be_bytes());
        // At most u16::MAX entries, checked when the header was built
        let signed = self.signed_columns.len() as u16;
        out.extend_from_slice(&signed.to_be_bytes());
        for column in &self.signed_columns {
            out.extend_from_slice(&column.to_be_bytes());
        }
    }

    /// Parse a header from the front of `buf`, returning it with its length
    ///
    /// # Errors
    /// * [`DecodeError::InvalidHeader`] on a wrong magic, version or variant
    /// * [`DecodeError::TruncatedStream`] if `buf` ends inside the header
    pub fn read(buf: &[u8]) -> Result<(Self, usize), DecodeError> {
        let magic_len = buf.len().min(HEADER_MAGIC.len());
        if buf[..magic_len] != HEADER_MAGIC[..magic_len] {
            return Err(DecodeError::InvalidHeader);
        }
        if buf.len() < HEADER_FIXED_SIZE {
            return Err(truncated(HEADER_FIXED_SIZE, buf.len()));
        }
        if buf[4] != HEADER_VERSION {
            return Err(DecodeError::InvalidHeader);
        }
        let variant = Variant::try_from(buf[5]).map_err(|_| DecodeError::InvalidHeader)?;
        let columns = read_u16_be(buf, 6);
        let signed = usize::from(read_u16_be(buf, 8));

        let len = HEADER_FIXED_SIZE + 2 * signed;
        if buf.len() < len {
            return Err(truncated(len, buf.len()));
        }
        let signed_columns = (0..signed)
            .map(|i| read_u16_be(buf, HEADER_FIXED_SIZE + 2 * i))
            .collect();

        Ok((
            Self {
                variant,
                columns,
                signed_columns,
            },
            len,
        ))
    }

    /// Check that this header describes `config`
    ///
    /// # Errors
    /// * [`DecodeError::Config`] if `config` itself is invalid
    /// * [`DecodeError::ConfigMismatch`] naming the first field that differs
    pub fn verify(&self, config: &CodecConfig) -> Result<(), DecodeError> {
        let expected = Self::from_config(config)?;
        if self.variant != expected.variant {
            return Err(mismatch("variant", expected.variant, self.variant));
        }
        if self.columns != expected.columns {
            return Err(mismatch("column count", expected.columns, self.columns));
        }
        if self.signed_columns != expected.signed_columns {
            return Err(mismatch(
                "signed columns",
                format!("{:?}", expected.signed_columns),
                format!("{:?}", self.signed_columns),
            ));
        }
        Ok(())
    }
}

#[inline]
fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn truncated(needed: usize, available: usize) -> DecodeError {
    DecodeError::TruncatedStream {
        offset: 0,
        needed,
        available,
    }
}

fn mismatch(field: &'static str, expected: impl ToString, actual: impl ToString) -> DecodeError {
    DecodeError::ConfigMismatch {
        field,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CodecConfig {
        CodecConfig::new(Variant::Rdes2, 3).with_signed_columns([0, 2]).with_framing(true)
    }

    #[test]
    fn layout() {
        let mut out = Vec::new();
        StreamHeader::from_config(&config()).unwrap().write(&mut out);
        assert_eq!(out, b"RDES\x01\x02\x00\x03\x00\x02\x00\x00\x00\x02".to_vec());
    }

    #[test]
    fn read_back() {
        let header = StreamHeader::from_config(&config()).unwrap();
        let mut out = Vec::new();
        header.write(&mut out);
        out.push(0xAA);
        let (parsed, len) = StreamHeader::read(&out).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(len, header.len());
        assert_eq!(parsed.verify(&config()), Ok(()));
    }

    #[test]
    fn short_input_is_truncated() {
        let mut out = Vec::new();
        StreamHeader::from_config(&config()).unwrap().write(&mut out);
        assert!(matches!(
            StreamHeader::read(&out[..3]),
            Err(DecodeError::TruncatedStream { needed: 10, available: 3, .. })
        ));
        assert!(matches!(
            StreamHeader::read(&out[..11]),
            Err(DecodeError::TruncatedStream { needed: 14, available: 11, .. })
        ));
    }

    #[test]
    fn bad_magic_fails_early() {
        assert_eq!(StreamHeader::read(b"RX"), Err(DecodeError::InvalidHeader));
        assert_eq!(StreamHeader::read(&[0x00, 0x00, 0x00, 0x64]), Err(DecodeError::InvalidHeader));
        assert_eq!(StreamHeader::read(b"RDES\x02\x01\x00\x01\x00\x00"), Err(DecodeError::InvalidHeader));
        assert_eq!(StreamHeader::read(b"RDES\x01\x07\x00\x01\x00\x00"), Err(DecodeError::InvalidHeader));
    }

    #[test]
    fn verify_names_mismatched_field() {
        let header = StreamHeader::from_config(&config()).unwrap();
        let other = CodecConfig::new(Variant::Rdes3, 3).with_signed_columns([0, 2]);
        assert!(matches!(
            header.verify(&other),
            Err(DecodeError::ConfigMismatch { field: "variant", .. })
        ));
        let other = CodecConfig::new(Variant::Rdes2, 4).with_signed_columns([0, 2]);
        assert!(matches!(
            header.verify(&other),
            Err(DecodeError::ConfigMismatch { field: "column count", .. })
        ));
        let other = CodecConfig::new(Variant::Rdes2, 3).with_signed_columns([0]);
        assert!(matches!(
            header.verify(&other),
            Err(DecodeError::ConfigMismatch { field: "signed columns", .. })
        ));
    }

    #[test]
    fn from_config_rejects_unrepresentable() {
        assert_eq!(
            StreamHeader::from_config(&CodecConfig::new(Variant::Rdes1, 0)),
            Err(ConfigError::NoColumns)
        );
        let wide = CodecConfig::new(Variant::Rdes1, 70_000).with_signed_columns([69_999]);
        assert_eq!(StreamHeader::from_config(&wide), Err(ConfigError::TooManyColumns(70_000)));
        assert_eq!(
            StreamHeader::from_config(&wide.clone().with_framing(true)),
            Err(ConfigError::TooManyColumns(70_000))
        );
    }

    #[test]
    fn verify_rejects_invalid_config() {
        let header = StreamHeader::from_config(&config()).unwrap();
        assert_eq!(
            header.verify(&CodecConfig::new(Variant::Rdes2, 0)),
            Err(DecodeError::Config(ConfigError::NoColumns))
        );
    }

    #[test]
    fn accessors() {
        let header = StreamHeader::from_config(&config()).unwrap();
        assert_eq!(header.variant(), Variant::Rdes2);
        assert_eq!(header.columns(), 3);
        assert_eq!(header.signed_columns(), &[0, 2]);
    }
}
