//! Wire-format constants and per-variant level tables.

use crate::variant::Level;

/// Top bit of a value's first byte: set for deltas, clear for raw values
pub(crate) const DELTA_FLAG: u8 = 0b1000_0000;

/// Second bit of a delta's first byte: set when the value increased
pub(crate) const SIGN_FLAG: u8 = 0b0100_0000;

/// Largest value that fits a raw encoding (bit 32 is the delta marker)
pub const RAW_VALUE_MAX: u32 = (1 << 31) - 1;

/// Bytes used by a raw (non-delta) value
pub const RAW_VALUE_BYTES: usize = 4;

/// Offset applied by `unsignify` / removed by `resignify`: (2^30 - 1) / 2
pub const SIGN_OFFSET: i64 = ((1 << 30) - 1) / 2;

// Level tables. Each entry: (bytes, magnitude bits, selector bits, selector mask).
// Selector bits live directly below the sign flag.

/// RDES1: a single 3-byte level, 6 magnitude bits in the lead byte
#[allow(clippy::unusual_byte_groupings)]
pub(crate) const RDES1_LEVELS: [Level; 1] = [Level::new(3, 22, 0b00_0_00000, 0b00_0_00000)];

/// RDES2: bit 6 selects 2 or 3 bytes, 5 magnitude bits in the lead byte
#[allow(clippy::unusual_byte_groupings)]
pub(crate) const RDES2_LEVELS: [Level; 2] = [
    Level::new(2, 13, 0b00_0_00000, 0b00_1_00000),
    Level::new(3, 21, 0b00_1_00000, 0b00_1_00000),
];

/// RDES3: bit 6 clear is the 1-byte level; otherwise bit 5 selects 2 or 3 bytes
#[allow(clippy::unusual_byte_groupings)]
pub(crate) const RDES3_LEVELS: [Level; 3] = [
    Level::new(1, 5, 0b00_00_0000, 0b00_10_0000),
    Level::new(2, 12, 0b00_10_0000, 0b00_11_0000),
    Level::new(3, 20, 0b00_11_0000, 0b00_11_0000),
];

/// Magic prefix of a framed stream
pub(crate) const HEADER_MAGIC: [u8; 4] = *b"RDES";

/// Framed stream format version
pub(crate) const HEADER_VERSION: u8 = 1;

/// Fixed part of the framed header: magic + version + variant + columns + signed count
pub(crate) const HEADER_FIXED_SIZE: usize = 4 + 1 + 1 + 2 + 2;
