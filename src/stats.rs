//! Size accounting shared by the compressor and decompressor.

use crate::constants::RAW_VALUE_BYTES;
use crate::error::MetricError;

/// Raw vs. compressed byte counts for a run of rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeStats {
    /// Rows processed
    pub rows: u64,
    /// Values per row
    pub columns: usize,
    /// Compressed bytes
    pub compressed: usize,
}

impl SizeStats {
    /// Size of the rows as plain 4-byte integers
    #[inline]
    #[must_use]
    pub fn uncompressed_size(&self) -> u64 {
        self.rows * (self.columns * RAW_VALUE_BYTES) as u64
    }

    /// Size of the compressed bytes
    #[inline]
    #[must_use]
    pub const fn compressed_size(&self) -> usize {
        self.compressed
    }

    /// Uncompressed size divided by compressed size
    ///
    /// # Errors
    /// Returns [`MetricError::NoCompressedData`] when there are no compressed bytes.
    pub fn compression_ratio(&self) -> Result<f64, MetricError> {
        if self.compressed == 0 {
            return Err(MetricError::NoCompressedData);
        }
        Ok(self.uncompressed_size() as f64 / self.compressed as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_needs_compressed_bytes() {
        let stats = SizeStats {
            rows: 0,
            columns: 3,
            compressed: 0,
        };
        assert_eq!(stats.compression_ratio(), Err(MetricError::NoCompressedData));
    }

    #[test]
    fn ratio_of_sizes() {
        let stats = SizeStats {
            rows: 4,
            columns: 1,
            compressed: 9,
        };
        assert_eq!(stats.uncompressed_size(), 16);
        assert!((stats.compression_ratio().unwrap() - 16.0 / 9.0).abs() < f64::EPSILON);
    }
}
