//! Small bit and byte helpers shared by the codec and the tools.

/// Truncate a value to its low 8 bits
#[inline]
#[must_use]
pub const fn byte(value: u32) -> u8 {
    (value & 0xFF) as u8
}

/// State of a bit in a byte, counting from 1 (LSB) to 8 (MSB)
///
/// ```text
/// MSB                         LSB
/// B8  B7  B6  B5  B4  B3  B2  B1
/// ```
#[inline]
#[must_use]
pub const fn check_bit(b: u8, position: u8) -> bool {
    debug_assert!(position >= 1 && position <= 8);
    b & (1 << (position - 1)) != 0
}

/// Binary rendering of a byte, e.g. `0b11000101`
#[must_use]
pub fn byte_to_str(b: u8) -> String {
    format!("{b:#010b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_masks_high_bits() {
        assert_eq!(byte(0x1234_5678), 0x78);
        assert_eq!(byte(0xFF), 0xFF);
        assert_eq!(byte(0x100), 0);
    }

    #[test]
    fn check_bit_positions() {
        assert!(check_bit(0b1000_0000, 8));
        assert!(!check_bit(0b1000_0000, 7));
        assert!(check_bit(0b0000_0001, 1));
        assert!(check_bit(0b0010_0000, 6));
        assert!(!check_bit(0b1101_1111, 6));
    }

    #[test]
    fn byte_to_str_is_zero_padded() {
        assert_eq!(byte_to_str(5), "0b00000101");
        assert_eq!(byte_to_str(0xC0), "0b11000000");
    }
}
