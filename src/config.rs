//! Codec configuration shared out-of-band by producer and consumer.
//!
//! Unframed RDES streams carry no description of themselves, so both sides
//! must be built from the same [`CodecConfig`]. The struct is serde-friendly
//! so it can be shipped alongside the data, e.g. as JSON.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::variant::Variant;

/// Settings that must match between a compressor and its decompressor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Bit-budget variant
    #[serde(default)]
    pub variant: Variant,
    /// Values per row
    pub columns: usize,
    /// Columns whose values are re-signed on output
    #[serde(default)]
    pub signed_columns: BTreeSet<usize>,
    /// Force a raw row after this many delta rows (0 = never)
    #[serde(default)]
    pub refresh_interval: u32,
    /// Prefix the stream with a self-describing header (changes the wire format)
    #[serde(default)]
    pub framed: bool,
}

impl CodecConfig {
    /// Unframed configuration with no signed columns and no raw refresh
    #[must_use]
    pub fn new(variant: Variant, columns: usize) -> Self {
        Self {
            variant,
            columns,
            signed_columns: BTreeSet::new(),
            refresh_interval: 0,
            framed: false,
        }
    }

    /// Mark columns as signed
    #[must_use]
    pub fn with_signed_columns(mut self, columns: impl IntoIterator<Item = usize>) -> Self {
        self.signed_columns.extend(columns);
        self
    }

    /// Force a raw row after every `rows` delta rows
    #[must_use]
    pub fn with_refresh_interval(mut self, rows: u32) -> Self {
        self.refresh_interval = rows;
        self
    }

    /// Enable or disable the stream header
    #[must_use]
    pub fn with_framing(mut self, framed: bool) -> Self {
        self.framed = framed;
        self
    }

    /// Whether `column` is re-signed on output
    #[inline]
    #[must_use]
    pub fn is_signed(&self, column: usize) -> bool {
        self.signed_columns.contains(&column)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    /// Returns an error if there are no columns, a signed column index is out
    /// of range, or a framed stream has more columns than its header can hold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        if self.framed && self.columns > usize::from(u16::MAX) {
            return Err(ConfigError::TooManyColumns(self.columns));
        }
        if let Some(&column) = self.signed_columns.iter().find(|&&c| c >= self.columns) {
            return Err(ConfigError::SignedColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = CodecConfig::new(Variant::Rdes2, 3)
            .with_signed_columns([2, 0])
            .with_refresh_interval(50)
            .with_framing(true);
        assert_eq!(config.variant, Variant::Rdes2);
        assert!(config.is_signed(0));
        assert!(!config.is_signed(1));
        assert!(config.is_signed(2));
        assert_eq!(config.refresh_interval, 50);
        assert!(config.framed);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_configs() {
        assert_eq!(CodecConfig::new(Variant::Rdes1, 0).validate(), Err(ConfigError::NoColumns));
        assert_eq!(
            CodecConfig::new(Variant::Rdes1, 2).with_signed_columns([2]).validate(),
            Err(ConfigError::SignedColumnOutOfRange { column: 2, columns: 2 })
        );
        assert_eq!(
            CodecConfig::new(Variant::Rdes1, 70_000).with_framing(true).validate(),
            Err(ConfigError::TooManyColumns(70_000))
        );
        assert_eq!(CodecConfig::new(Variant::Rdes1, 70_000).validate(), Ok(()));
    }

    #[test]
    fn json_defaults() {
        let config: CodecConfig = serde_json::from_str(r#"{"columns": 2}"#).unwrap();
        assert_eq!(config, CodecConfig::new(Variant::Rdes3, 2));

        let config: CodecConfig =
            serde_json::from_str(r#"{"variant": 1, "columns": 4, "signed_columns": [3], "refresh_interval": 10}"#)
                .unwrap();
        assert_eq!(
            config,
            CodecConfig::new(Variant::Rdes1, 4)
                .with_signed_columns([3])
                .with_refresh_interval(10)
        );

        assert!(serde_json::from_str::<CodecConfig>(r#"{"variant": 4, "columns": 1}"#).is_err());
    }

    #[test]
    fn json_round_trip() {
        let config = CodecConfig::new(Variant::Rdes2, 5).with_signed_columns([1, 4]).with_framing(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<CodecConfig>(&json).unwrap(), config);
    }
}
